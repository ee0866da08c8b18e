//! Text codec for rally messages.
//!
//! The message body is the only persistent copy of a rally, so
//! [`decode`] and [`encode`] must round-trip exactly for every record the
//! engine produces. The grammar is line oriented:
//!
//! ```text
//! ❌ СБОР ОТМЕНЁН ❌          (optional, first line only)
//! 🎉 Сбор: <name>
//! 📅 Дата: <date>
//! 🔢 Лимит: <limit>
//! 👤 Инициатор: <identity>
//!
//! ✍️ Записались:
//! 1) <entry>
//! 2)
//!
//! ⏳ Лист ожидания:          (only when non-empty)
//! 3) <entry>
//!
//! ✏️ Карандашом:
//! <entry>
//! ```

use rally_proto::{LIMIT_MAX, ListKind, MissingField, ParseError, Rally};

use crate::instance::parse_entry;

/// First line of a cancelled rally.
pub const CANCEL_MARKER: &str = "❌ СБОР ОТМЕНЁН ❌";

const NAME_LABEL: &str = "Сбор:";
const DATE_LABEL: &str = "Дата:";
const LIMIT_LABEL: &str = "Лимит:";
const INITIATOR_LABEL: &str = "Инициатор:";
const SIGNED_LABEL: &str = "Записались:";
const WAITING_LABEL: &str = "Лист ожидания:";
const PENCIL_LABEL: &str = "Карандашом:";

/// Leading glyphs that decorate labelled lines. Variation selectors are
/// listed separately because some clients drop them.
const DECORATIONS: [&str; 11] = [
    "🎉", "📅", "🔢", "👤", "✍️", "✍", "✏️", "✏", "❌", "⏳", "\u{fe0f}",
];

/// A classified line of the record grammar.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Name(&'a str),
    Date(&'a str),
    Limit(&'a str),
    Initiator(&'a str),
    Header(ListKind),
    Blank,
    Body(&'a str),
}

impl<'a> Line<'a> {
    fn classify(raw: &'a str) -> Self {
        let line = strip_decorations(raw);
        if line.is_empty() {
            return Line::Blank;
        }

        let scalars: [(&str, fn(&'a str) -> Line<'a>); 4] = [
            (NAME_LABEL, Line::Name),
            (DATE_LABEL, Line::Date),
            (LIMIT_LABEL, Line::Limit),
            (INITIATOR_LABEL, Line::Initiator),
        ];
        for (label, make) in scalars {
            if let Some(value) = line.strip_prefix(label) {
                return make(value.trim());
            }
        }

        let headers = [
            (SIGNED_LABEL, ListKind::Signed),
            (WAITING_LABEL, ListKind::Waiting),
            (PENCIL_LABEL, ListKind::Pencil),
        ];
        for (label, kind) in headers {
            if line.starts_with(label) {
                return Line::Header(kind);
            }
        }

        Line::Body(line)
    }
}

fn strip_decorations(raw: &str) -> &str {
    let mut line = raw.trim();
    while let Some(rest) = DECORATIONS
        .iter()
        .find_map(|glyph| line.strip_prefix(glyph))
    {
        line = rest.trim_start();
    }
    line
}

/// True when the first line of `text` is the cancellation marker.
pub fn is_cancelled(text: &str) -> bool {
    text.lines()
        .next()
        .is_some_and(|first| first.trim() == CANCEL_MARKER)
}

/// Returns `text` without its cancellation marker line, if it has one.
pub fn strip_cancel_marker(text: &str) -> &str {
    if !is_cancelled(text) {
        return text;
    }
    text.split_once('\n').map_or("", |(_, body)| body)
}

/// Decode a message body into a [`Rally`].
///
/// Lines before the first section header that are not labelled are
/// ignored, as are blank lines. A missing section simply leaves that list
/// empty.
pub fn decode(text: &str) -> Result<Rally, ParseError> {
    let cancelled = is_cancelled(text);
    let mut rally = Rally {
        cancelled,
        ..Rally::default()
    };
    let mut section: Option<ListKind> = None;

    for raw in strip_cancel_marker(text).lines() {
        // The pencil block is written last and its items are bare, so
        // nothing inside it is read as a label.
        let line = if section == Some(ListKind::Pencil) {
            match raw.trim() {
                "" => Line::Blank,
                item => Line::Body(item),
            }
        } else {
            Line::classify(raw)
        };
        match line {
            Line::Name(value) => rally.name = value.to_string(),
            Line::Date(value) => rally.date = value.to_string(),
            Line::Limit(value) => rally.limit = parse_limit(value)?,
            Line::Initiator(value) => rally.initiator = value.to_string(),
            Line::Header(kind) => section = Some(kind),
            Line::Blank => {}
            Line::Body(line) => {
                let Some(kind) = section else { continue };
                let item = match kind {
                    ListKind::Signed | ListKind::Waiting => roster_item(line),
                    ListKind::Pencil => Some(line),
                };
                if let Some(item) = item {
                    rally.list_mut(kind).push(parse_entry(item));
                }
            }
        }
    }

    if rally.name.is_empty() {
        return Err(ParseError::MissingField(MissingField::Name));
    }
    if rally.date.is_empty() {
        return Err(ParseError::MissingField(MissingField::Date));
    }
    if rally.initiator.is_empty() {
        return Err(ParseError::MissingField(MissingField::Initiator));
    }

    Ok(rally)
}

fn parse_limit(value: &str) -> Result<usize, ParseError> {
    if value.is_empty() {
        return Ok(0);
    }
    let limit: usize = value
        .parse()
        .map_err(|_| ParseError::InvalidLimit(value.to_string()))?;
    if !i64::try_from(limit).is_ok_and(|n| n <= LIMIT_MAX) {
        return Err(ParseError::InvalidLimit(value.to_string()));
    }
    Ok(limit)
}

/// Extract the entry from an `<ordinal>) <entry>` roster line.
fn roster_item(line: &str) -> Option<&str> {
    let (_, rest) = line.split_once(' ')?;
    let item = rest.trim();
    (!item.is_empty()).then_some(item)
}

/// Encode a rally into its message body.
///
/// The roster always shows exactly `limit` numbered seats; the waiting
/// list continues the numbering and is omitted while empty; the pencil
/// section is always present.
pub fn encode(rally: &Rally) -> String {
    let mut out = String::new();
    if rally.cancelled {
        out.push_str(CANCEL_MARKER);
        out.push('\n');
    }

    out.push_str(&format!(
        "🎉 {NAME_LABEL} {}\n📅 {DATE_LABEL} {}\n🔢 {LIMIT_LABEL} {}\n👤 {INITIATOR_LABEL} {}\n\n✍️ {SIGNED_LABEL}\n",
        rally.name, rally.date, rally.limit, rally.initiator,
    ));

    for seat in 0..rally.limit {
        match rally.signed_up.get(seat) {
            Some(entry) => out.push_str(&format!("{}) {entry}\n", seat + 1)),
            None => out.push_str(&format!("{})\n", seat + 1)),
        }
    }

    if !rally.waiting_list.is_empty() {
        out.push_str(&format!("\n⏳ {WAITING_LABEL}\n"));
        for (i, entry) in rally.waiting_list.iter().enumerate() {
            out.push_str(&format!("{}) {entry}\n", rally.limit + i + 1));
        }
    }

    out.push_str(&format!("\n✏️ {PENCIL_LABEL}\n"));
    for entry in &rally.penciled_in {
        out.push_str(&format!("{entry}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_proto::Entry;

    fn sample() -> Rally {
        let mut rally = Rally::new("Волейбол", "пятница 19:00", 3, "@host");
        rally.signed_up = vec![Entry::member("@a", 0), Entry::member("@a", 1)];
        rally.penciled_in = vec![Entry::member("Петров Иван", 0)];
        rally
    }

    #[test]
    fn encode_renders_empty_seats_and_pencil_section() {
        let text = encode(&sample());
        assert_eq!(
            text,
            "🎉 Сбор: Волейбол\n📅 Дата: пятница 19:00\n🔢 Лимит: 3\n👤 Инициатор: @host\n\n\
             ✍️ Записались:\n1) @a\n2) @a +1\n3)\n\n✏️ Карандашом:\nПетров Иван\n"
        );
    }

    #[test]
    fn waiting_list_numbering_continues_after_limit() {
        let mut rally = Rally::new("Футбол", "суббота", 2, "@host");
        rally.signed_up = vec![Entry::member("@a", 0), Entry::member("@b", 0)];
        rally.waiting_list = vec![Entry::member("@c", 0), Entry::member("@d", 0)];

        let text = encode(&rally);
        assert!(text.contains("\n⏳ Лист ожидания:\n3) @c\n4) @d\n"));
    }

    #[test]
    fn round_trip_reconstructs_rally() {
        let mut rally = sample();
        rally.limit = 2;
        rally.waiting_list = vec![Entry::member("@b", 0), Entry::opaque("Bob +x")];
        assert_eq!(decode(&encode(&rally)).unwrap(), rally);
    }

    #[test]
    fn round_trip_preserves_cancellation() {
        let mut rally = sample();
        rally.cancelled = true;
        let text = encode(&rally);
        assert!(text.starts_with("❌ СБОР ОТМЕНЁН ❌\n🎉 Сбор:"));
        assert_eq!(decode(&text).unwrap(), rally);
    }

    #[test]
    fn round_trip_survives_trimmed_transport_text() {
        let rally = sample();
        let text = encode(&rally);
        assert_eq!(decode(text.trim_end()).unwrap(), rally);
    }

    #[test]
    fn empty_limit_decodes_as_zero() {
        let rally = decode("Сбор: x\nДата: y\nЛимит:\nИнициатор: z").unwrap();
        assert_eq!(rally.limit, 0);
    }

    #[test]
    fn non_numeric_limit_is_rejected() {
        let err = decode("Сбор: x\nДата: y\nЛимит: ten\nИнициатор: z").unwrap_err();
        assert_eq!(err, ParseError::InvalidLimit("ten".to_string()));
    }

    #[test]
    fn limit_above_creation_range_is_rejected() {
        let err = decode("Сбор: x\nДата: y\nЛимит: 5000000000\nИнициатор: z").unwrap_err();
        assert_eq!(err, ParseError::InvalidLimit("5000000000".to_string()));
        assert!(decode("Сбор: x\nДата: y\nЛимит: 31\nИнициатор: z").is_err());
        assert_eq!(decode("Сбор: x\nДата: y\nЛимит: 30\nИнициатор: z").unwrap().limit, 30);
    }

    #[test]
    fn label_shaped_pencil_entries_round_trip() {
        let mut rally = sample();
        rally.penciled_in = vec![
            Entry::member("Инициатор: Eve", 0),
            Entry::member("Лимит: x", 0),
            Entry::member("⏳ Лист ожидания:", 0),
            Entry::member("🎉 Сбор: party", 1),
        ];
        let decoded = decode(&encode(&rally)).unwrap();
        assert_eq!(decoded.initiator, "@host");
        assert_eq!(decoded, rally);
    }

    #[test]
    fn negative_limit_is_rejected() {
        let err = decode("Сбор: x\nДата: y\nЛимит: -2\nИнициатор: z").unwrap_err();
        assert!(matches!(err, ParseError::InvalidLimit(_)));
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        assert_eq!(
            decode("Дата: y\nИнициатор: z").unwrap_err(),
            ParseError::MissingField(MissingField::Name)
        );
        assert_eq!(
            decode("Сбор: x\nИнициатор: z").unwrap_err(),
            ParseError::MissingField(MissingField::Date)
        );
        assert_eq!(
            decode("Сбор: x\nДата: y").unwrap_err(),
            ParseError::MissingField(MissingField::Initiator)
        );
    }

    #[test]
    fn lines_before_any_section_are_ignored() {
        let rally = decode("stray text\n🎉 Сбор: x\n📅 Дата: y\n👤 Инициатор: z\n1) @ghost").unwrap();
        assert!(rally.signed_up.is_empty());
        assert!(rally.waiting_list.is_empty());
        assert!(rally.penciled_in.is_empty());
    }

    #[test]
    fn blank_lines_do_not_reset_section() {
        let text = "Сбор: x\nДата: y\nИнициатор: z\nКарандашом:\n@a\n\n@b\n";
        let rally = decode(text).unwrap();
        assert_eq!(
            rally.penciled_in,
            vec![Entry::member("@a", 0), Entry::member("@b", 0)]
        );
    }

    #[test]
    fn decorations_without_variation_selector_are_stripped() {
        let text = "Сбор: x\nДата: y\nЛимит: 2\nИнициатор: z\n✍ Записались:\n1) @a\n2)";
        let rally = decode(text).unwrap();
        assert_eq!(rally.signed_up, vec![Entry::member("@a", 0)]);
    }

    #[test]
    fn strip_cancel_marker_only_touches_first_line() {
        assert_eq!(strip_cancel_marker("❌ СБОР ОТМЕНЁН ❌\nbody"), "body");
        assert_eq!(strip_cancel_marker("body\n❌ СБОР ОТМЕНЁН ❌"), "body\n❌ СБОР ОТМЕНЁН ❌");
    }
}
