use serde::{Deserialize, Serialize};

/// Raw button-box key identifier. The lab boxes report the digit keys
/// "1"/"2" (chamber one) and "7"/"8" (chamber two).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(pub char);

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Labelled response for a trial. A task variant only ever produces its own
/// label pair plus `NoResponse`; the union lives here so one record type
/// covers both variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Yes,
    No,
    Left,
    Right,
    #[serde(rename = "noresponse")]
    NoResponse,
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Response::Yes => "yes",
            Response::No => "no",
            Response::Left => "left",
            Response::Right => "right",
            Response::NoResponse => "noresponse",
        };
        write!(f, "{s}")
    }
}

/// Response-speed annotation from the dot task: reaction times above the slow
/// bound or below the fast bound get called out during feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RtFlag {
    #[serde(rename = "NA")]
    Na,
    #[serde(rename = "slow")]
    Slow,
    #[serde(rename = "fast")]
    Fast,
}

impl Default for RtFlag {
    fn default() -> Self {
        RtFlag::Na
    }
}

/// Per-participant key-to-label table. Keys outside the table are ignored
/// while the window is open; a window that closes without a mapped press
/// resolves to `Response::NoResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonMap {
    pairs: [(Key, Response); 2],
}

impl ButtonMap {
    /// `keys[i]` maps to `labels[i]`. Which label lands on which physical key
    /// is a counterbalancing decision made per pair id by the session setup.
    pub fn new(keys: [Key; 2], labels: [Response; 2]) -> Self {
        Self {
            pairs: [(keys[0], labels[0]), (keys[1], labels[1])],
        }
    }

    /// Label for a pressed key, or `None` when the key is not one of this
    /// participant's buttons.
    pub fn response_for(&self, key: Key) -> Option<Response> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| *label)
    }

    /// Inverse lookup, used by simulated participants to press the key that
    /// produces a wanted label.
    pub fn key_for(&self, response: Response) -> Option<Key> {
        self.pairs
            .iter()
            .find(|(_, label)| *label == response)
            .map(|(k, _)| *k)
    }

    pub fn keys(&self) -> [Key; 2] {
        [self.pairs[0].0, self.pairs[1].0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_both_keys_and_ignores_foreign_keys() {
        let map = ButtonMap::new(
            [Key('1'), Key('2')],
            [Response::No, Response::Yes],
        );
        assert_eq!(map.response_for(Key('1')), Some(Response::No));
        assert_eq!(map.response_for(Key('2')), Some(Response::Yes));
        assert_eq!(map.response_for(Key('7')), None);
    }

    #[test]
    fn key_for_inverts_response_for() {
        let map = ButtonMap::new(
            [Key('8'), Key('7')],
            [Response::Left, Response::Right],
        );
        assert_eq!(map.key_for(Response::Right), Some(Key('7')));
        assert_eq!(map.key_for(Response::Left), Some(Key('8')));
        assert_eq!(map.key_for(Response::Yes), None);
        assert_eq!(map.key_for(Response::NoResponse), None);
    }
}
