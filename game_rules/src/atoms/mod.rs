//! Change atoms - the unit of state mutation an oracle may propose.
//!
//! The wire form is a JSON object tagged by `"type"`:
//!
//! ```json
//! {"type": "add_item", "item": "lantern"}
//! {"type": "set_flag", "flag": "gate_open", "value": true}
//! {"type": "hp_delta", "delta": -3}
//! ```
//!
//! Oracle output is untrusted, so decoding never fails as a whole:
//! each element becomes a [`ProposedAtom`] that is either a well-formed
//! [`ChangeAtom`] or an anomaly the validator rejects.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// A legal kind of state mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeAtom {
    AddItem {
        item: String,
    },
    RemoveItem {
        item: String,
    },
    MoveTo {
        location: String,
    },
    SetFlag {
        flag: String,
        #[serde(default = "default_flag_value")]
        value: bool,
    },
    HpDelta {
        delta: i64,
    },
}

fn default_flag_value() -> bool {
    true
}

impl ChangeAtom {
    /// Every wire tag, in declaration order.
    pub const TAGS: [&'static str; 5] = ["add_item", "remove_item", "move_to", "set_flag", "hp_delta"];

    pub fn add_item(item: impl Into<String>) -> Self {
        ChangeAtom::AddItem { item: item.into() }
    }

    pub fn remove_item(item: impl Into<String>) -> Self {
        ChangeAtom::RemoveItem { item: item.into() }
    }

    pub fn move_to(location: impl Into<String>) -> Self {
        ChangeAtom::MoveTo {
            location: location.into(),
        }
    }

    pub fn set_flag(flag: impl Into<String>, value: bool) -> Self {
        ChangeAtom::SetFlag {
            flag: flag.into(),
            value,
        }
    }

    pub fn hp_delta(delta: i64) -> Self {
        ChangeAtom::HpDelta { delta }
    }

    /// The wire tag of this atom.
    pub fn tag(&self) -> &'static str {
        match self {
            ChangeAtom::AddItem { .. } => "add_item",
            ChangeAtom::RemoveItem { .. } => "remove_item",
            ChangeAtom::MoveTo { .. } => "move_to",
            ChangeAtom::SetFlag { .. } => "set_flag",
            ChangeAtom::HpDelta { .. } => "hp_delta",
        }
    }
}

impl fmt::Display for ChangeAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAtom::AddItem { item } => write!(f, "add_item({item})"),
            ChangeAtom::RemoveItem { item } => write!(f, "remove_item({item})"),
            ChangeAtom::MoveTo { location } => write!(f, "move_to({location})"),
            ChangeAtom::SetFlag { flag, value } => write!(f, "set_flag({flag}={value})"),
            ChangeAtom::HpDelta { delta } => write!(f, "hp_delta({delta:+})"),
        }
    }
}

/// One element of an oracle's `state_change` list, decoded leniently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposedAtom {
    /// A well-formed atom of a known kind.
    Known(ChangeAtom),

    /// The `type` tag is missing or names no known kind.
    Unknown { tag: Option<String>, raw: Value },

    /// The tag is known but the fields do not decode.
    Malformed {
        tag: String,
        reason: String,
        raw: Value,
    },
}

impl ProposedAtom {
    /// Classify a raw JSON element.
    pub fn from_value(raw: Value) -> Self {
        let tag = raw.get("type").and_then(Value::as_str).map(str::to_owned);

        match tag {
            Some(tag) if ChangeAtom::TAGS.iter().any(|known| *known == tag) => {
                match serde_json::from_value::<ChangeAtom>(raw.clone()) {
                    Ok(atom) => ProposedAtom::Known(atom),
                    Err(err) => ProposedAtom::Malformed {
                        tag,
                        reason: err.to_string(),
                        raw,
                    },
                }
            }
            tag => ProposedAtom::Unknown { tag, raw },
        }
    }

    /// The tag as the oracle wrote it, if any.
    pub fn tag(&self) -> Option<&str> {
        match self {
            ProposedAtom::Known(atom) => Some(atom.tag()),
            ProposedAtom::Unknown { tag, .. } => tag.as_deref(),
            ProposedAtom::Malformed { tag, .. } => Some(tag.as_str()),
        }
    }
}

impl From<ChangeAtom> for ProposedAtom {
    fn from(atom: ChangeAtom) -> Self {
        ProposedAtom::Known(atom)
    }
}

impl fmt::Display for ProposedAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposedAtom::Known(atom) => fmt::Display::fmt(atom, f),
            ProposedAtom::Unknown { raw, .. } | ProposedAtom::Malformed { raw, .. } => {
                write!(f, "{raw}")
            }
        }
    }
}

impl Serialize for ProposedAtom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProposedAtom::Known(atom) => atom.serialize(serializer),
            ProposedAtom::Unknown { raw, .. } | ProposedAtom::Malformed { raw, .. } => {
                raw.serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for ProposedAtom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ProposedAtom::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_each_kind() {
        let cases = vec![
            (json!({"type": "add_item", "item": "key"}), ChangeAtom::add_item("key")),
            (json!({"type": "remove_item", "item": "key"}), ChangeAtom::remove_item("key")),
            (json!({"type": "move_to", "location": "vault"}), ChangeAtom::move_to("vault")),
            (
                json!({"type": "set_flag", "flag": "lit", "value": false}),
                ChangeAtom::set_flag("lit", false),
            ),
            (json!({"type": "hp_delta", "delta": -4}), ChangeAtom::hp_delta(-4)),
        ];

        for (raw, expected) in cases {
            assert_eq!(ProposedAtom::from_value(raw), ProposedAtom::Known(expected));
        }
    }

    #[test]
    fn test_set_flag_value_defaults_true() {
        let atom = ProposedAtom::from_value(json!({"type": "set_flag", "flag": "lit"}));
        assert_eq!(atom, ProposedAtom::Known(ChangeAtom::set_flag("lit", true)));
    }

    #[test]
    fn test_unknown_tag() {
        let atom = ProposedAtom::from_value(json!({"type": "teleport", "to": "moon"}));
        assert!(matches!(&atom, ProposedAtom::Unknown { tag: Some(t), .. } if t == "teleport"));
        assert_eq!(atom.tag(), Some("teleport"));
    }

    #[test]
    fn test_missing_tag_and_non_object_are_unknown() {
        assert!(matches!(
            ProposedAtom::from_value(json!({"item": "key"})),
            ProposedAtom::Unknown { tag: None, .. }
        ));
        assert!(matches!(
            ProposedAtom::from_value(json!("add_item")),
            ProposedAtom::Unknown { tag: None, .. }
        ));
    }

    #[test]
    fn test_known_tag_with_bad_fields_is_malformed() {
        let atom = ProposedAtom::from_value(json!({"type": "hp_delta", "delta": "lots"}));
        assert!(matches!(&atom, ProposedAtom::Malformed { tag, .. } if tag == "hp_delta"));

        let atom = ProposedAtom::from_value(json!({"type": "add_item"}));
        assert!(matches!(atom, ProposedAtom::Malformed { .. }));
    }

    #[test]
    fn test_decode_list_never_fails_on_anomalies() {
        let atoms: Vec<ProposedAtom> = serde_json::from_value(json!([
            {"type": "add_item", "item": "key"},
            {"type": "dance"},
            42
        ]))
        .unwrap();

        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[0], ProposedAtom::Known(ChangeAtom::add_item("key")));
    }

    #[test]
    fn test_serialize_uses_wire_tags() {
        let value = serde_json::to_value(ChangeAtom::set_flag("lit", true)).unwrap();
        assert_eq!(value, json!({"type": "set_flag", "flag": "lit", "value": true}));

        let unknown = ProposedAtom::from_value(json!({"type": "dance"}));
        assert_eq!(serde_json::to_value(&unknown).unwrap(), json!({"type": "dance"}));
    }

    #[test]
    fn test_display() {
        assert_eq!(ChangeAtom::hp_delta(3).to_string(), "hp_delta(+3)");
        assert_eq!(ChangeAtom::hp_delta(-3).to_string(), "hp_delta(-3)");
        assert_eq!(ChangeAtom::set_flag("lit", false).to_string(), "set_flag(lit=false)");
    }

    #[test]
    fn test_tags_cover_every_kind() {
        let atoms = [
            ChangeAtom::add_item("a"),
            ChangeAtom::remove_item("a"),
            ChangeAtom::move_to("a"),
            ChangeAtom::set_flag("a", true),
            ChangeAtom::hp_delta(0),
        ];
        let tags: Vec<_> = atoms.iter().map(ChangeAtom::tag).collect();
        assert_eq!(tags, ChangeAtom::TAGS);
    }
}
