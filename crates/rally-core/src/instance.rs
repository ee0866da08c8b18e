//! Instance algebra: who owns which slot, and how slots come and go.
//!
//! One identity may hold up to [`MAX_PLUS_FRIENDS`] slots across all three
//! lists. Slots are numbered: `0` is the person, `N > 0` their guests.
//! Adding always takes the next number above the current maximum;
//! removing always takes the highest number (LIFO), and a seat freed in
//! the main roster is refilled from the front of the waiting list (FIFO).

use rally_proto::{Entry, ListKind, MAX_PLUS_FRIENDS, Rally};

/// Split an entry into its identity and instance number.
///
/// The split happens on the last `+`. Returns `None` when the base is
/// empty or the suffix is not a non-negative integer; such entries are
/// opaque to every identity-targeted operation.
pub fn parse_instance(raw: &str) -> Option<(&str, u32)> {
    let entry = raw.trim();
    if entry.is_empty() {
        return None;
    }

    let Some((base, suffix)) = entry.rsplit_once('+') else {
        return Some((entry, 0));
    };

    let base = base.trim();
    if base.is_empty() {
        return None;
    }
    let n = suffix.trim().parse::<u32>().ok()?;
    Some((base, n))
}

/// True when `identity` renders as an entry that parses back to itself at
/// instance 0. A `+` or a line break in a display name would make its
/// entries opaque, and opaque entries are neither counted nor removable.
pub fn is_plain_identity(identity: &str) -> bool {
    !identity.contains(['\n', '\r']) && parse_instance(identity) == Some((identity, 0))
}

/// Parse a rendered list item into an [`Entry`].
pub fn parse_entry(raw: &str) -> Entry {
    match parse_instance(raw) {
        Some((identity, n)) => Entry::member(identity, n),
        None => Entry::opaque(raw.trim()),
    }
}

/// Every instance number owned by `identity`, in scan order.
pub fn find_all_instances(rally: &Rally, identity: &str) -> Vec<u32> {
    rally
        .entries()
        .filter_map(|(_, entry)| entry.owner())
        .filter(|(owner, _)| *owner == identity)
        .map(|(_, n)| n)
        .collect()
}

/// Highest instance number owned by `identity`, if it owns any.
pub fn max_instance(rally: &Rally, identity: &str) -> Option<u32> {
    find_all_instances(rally, identity).into_iter().max()
}

/// Whether [`add_instance`] would append a slot for `identity`.
///
/// Both the slot count and the next number are capped, so gaps left by
/// earlier removals never let an identity exceed the limit.
pub fn can_add_instance(rally: &Rally, identity: &str) -> bool {
    let owned = find_all_instances(rally, identity);
    let count = u32::try_from(owned.len()).unwrap_or(u32::MAX);
    count < MAX_PLUS_FRIENDS && owned.iter().all(|&n| n < MAX_PLUS_FRIENDS)
}

/// Append the next instance of `identity` to the `target` list.
///
/// Returns `false` (and leaves the rally untouched) when the identity is
/// not plain or already at the cap; callers check [`can_add_instance`] first so they can
/// tell the user.
pub fn add_instance(rally: &mut Rally, target: ListKind, identity: &str) -> bool {
    if !is_plain_identity(identity) || !can_add_instance(rally, identity) {
        return false;
    }
    let next = max_instance(rally, identity).map_or(0, |n| n + 1);
    rally.list_mut(target).push(Entry::member(identity, next));
    true
}

/// Put `entry` into the main roster if a seat is free, else the waiting list.
pub fn seat(rally: &mut Rally, entry: Entry) -> ListKind {
    let kind = if rally.has_room() {
        ListKind::Signed
    } else {
        ListKind::Waiting
    };
    rally.list_mut(kind).push(entry);
    kind
}

/// Index of the lowest-numbered pencil instance of `identity`.
pub fn lowest_pencil_instance(rally: &Rally, identity: &str) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (idx, entry) in rally.penciled_in.iter().enumerate() {
        let Some((owner, n)) = entry.owner() else {
            continue;
        };
        if owner == identity && best.is_none_or(|(_, min)| n < min) {
            best = Some((idx, n));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Remove the globally highest instance of `identity`.
///
/// Ties go to the list scanned first (signed, then waiting, then pencil).
/// When the removed slot was in the main roster, the front of the waiting
/// list is promoted into it. Returns the removed entry.
pub fn remove_highest_instance(rally: &mut Rally, identity: &str) -> Option<Entry> {
    let mut best: Option<(ListKind, usize, u32)> = None;
    for kind in ListKind::SCAN_ORDER {
        for (idx, entry) in rally.list(kind).iter().enumerate() {
            let Some((owner, n)) = entry.owner() else {
                continue;
            };
            if owner == identity && best.is_none_or(|(_, _, max)| n > max) {
                best = Some((kind, idx, n));
            }
        }
    }

    let (kind, idx, _) = best?;
    let removed = rally.list_mut(kind).remove(idx);

    if kind == ListKind::Signed && !rally.waiting_list.is_empty() {
        let promoted = rally.waiting_list.remove(0);
        rally.signed_up.push(promoted);
    }

    Some(removed)
}
