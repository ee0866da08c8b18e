use std::fmt;

use serde::{Deserialize, Serialize};

/// One occupied slot in a rally list.
///
/// `Member` entries belong to an identity; instance `0` is the person
/// themselves and `N > 0` is their N-th guest. `Opaque` entries are lines
/// whose guest suffix could not be read: they are kept and re-rendered
/// verbatim but never matched to anyone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Member { identity: String, instance: u32 },
    Opaque { raw: String },
}

impl Entry {
    pub fn member(identity: impl Into<String>, instance: u32) -> Self {
        Entry::Member {
            identity: identity.into(),
            instance,
        }
    }

    pub fn opaque(raw: impl Into<String>) -> Self {
        Entry::Opaque { raw: raw.into() }
    }

    /// Returns the owning identity and instance number, if any.
    pub fn owner(&self) -> Option<(&str, u32)> {
        match self {
            Entry::Member { identity, instance } => Some((identity.as_str(), *instance)),
            Entry::Opaque { .. } => None,
        }
    }

    /// True when this entry is an instance owned by `identity`.
    pub fn is_owned_by(&self, identity: &str) -> bool {
        self.owner().is_some_and(|(owner, _)| owner == identity)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Member {
                identity,
                instance: 0,
            } => f.write_str(identity),
            Entry::Member { identity, instance } => write!(f, "{identity} +{instance}"),
            Entry::Opaque { raw } => f.write_str(raw),
        }
    }
}

/// The three lists of a rally, in the order every scan walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Signed,
    Waiting,
    Pencil,
}

impl ListKind {
    pub const SCAN_ORDER: [ListKind; 3] = [ListKind::Signed, ListKind::Waiting, ListKind::Pencil];
}

/// A sign-up record, decoded from the text of one chat message.
///
/// A `Rally` never outlives the handling of a single action: the message
/// text is the durable copy, this is a transient view of it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rally {
    pub name: String,
    pub date: String,
    pub limit: usize,
    pub initiator: String,
    pub signed_up: Vec<Entry>,
    pub waiting_list: Vec<Entry>,
    pub penciled_in: Vec<Entry>,
    /// Whether the text carries the cancellation marker as its first line.
    pub cancelled: bool,
}

impl Rally {
    /// Create an empty, active rally.
    pub fn new(
        name: impl Into<String>,
        date: impl Into<String>,
        limit: usize,
        initiator: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            limit,
            initiator: initiator.into(),
            ..Self::default()
        }
    }

    /// True while the main roster still has a free seat.
    pub fn has_room(&self) -> bool {
        self.signed_up.len() < self.limit
    }

    pub fn list(&self, kind: ListKind) -> &[Entry] {
        match kind {
            ListKind::Signed => &self.signed_up,
            ListKind::Waiting => &self.waiting_list,
            ListKind::Pencil => &self.penciled_in,
        }
    }

    pub fn list_mut(&mut self, kind: ListKind) -> &mut Vec<Entry> {
        match kind {
            ListKind::Signed => &mut self.signed_up,
            ListKind::Waiting => &mut self.waiting_list,
            ListKind::Pencil => &mut self.penciled_in,
        }
    }

    /// Iterate over every entry, signed first, then waiting, then pencil.
    pub fn entries(&self) -> impl Iterator<Item = (ListKind, &Entry)> {
        ListKind::SCAN_ORDER
            .into_iter()
            .flat_map(move |kind| self.list(kind).iter().map(move |entry| (kind, entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_instance_renders_bare() {
        assert_eq!(Entry::member("@anna", 0).to_string(), "@anna");
    }

    #[test]
    fn guest_instance_renders_with_suffix() {
        assert_eq!(Entry::member("@anna", 3).to_string(), "@anna +3");
    }

    #[test]
    fn opaque_entry_has_no_owner() {
        let entry = Entry::opaque("Bob +x");
        assert_eq!(entry.owner(), None);
        assert!(!entry.is_owned_by("Bob"));
        assert_eq!(entry.to_string(), "Bob +x");
    }

    #[test]
    fn entries_walk_lists_in_scan_order() {
        let mut rally = Rally::new("Football", "Friday", 2, "@host");
        rally.penciled_in.push(Entry::member("@c", 0));
        rally.signed_up.push(Entry::member("@a", 0));
        rally.waiting_list.push(Entry::member("@b", 0));

        let kinds: Vec<ListKind> = rally.entries().map(|(kind, _)| kind).collect();
        assert_eq!(
            kinds,
            vec![ListKind::Signed, ListKind::Waiting, ListKind::Pencil]
        );
    }

    #[test]
    fn has_room_tracks_limit() {
        let mut rally = Rally::new("Football", "Friday", 1, "@host");
        assert!(rally.has_room());
        rally.signed_up.push(Entry::member("@a", 0));
        assert!(!rally.has_room());
    }
}
