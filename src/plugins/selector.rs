//! Line protocol between the resource cache and an external fuzzy picker.
//!
//! Each resource becomes one line:
//!
//! ```text
//! <visible segment>\t<name>\t<type>\t<resourceGroup>\t<subscriptionId>\t<location>\t<id>
//! ```
//!
//! The visible segment is fixed-width and lossy (truncated name, short type,
//! truncated group). The six hidden fields carry the full values so the chosen
//! line can be resolved back to exactly one resource. Resolution prefers
//! `(id, subscriptionId)` and only falls back to
//! `(name, type, resourceGroup, subscriptionId)` when no id matches.
//!
//! Tab, CR and LF inside a field would break the framing, so they are
//! replaced by a space on encode. Decoding compares against the same sanitized
//! form, which keeps such resources selectable.

use crate::core::config::ColumnWidths;
use crate::core::resource::Resource;
use std::borrow::Cow;
use std::fmt::Write as _;

pub const FIELD_DELIMITER: char = '\t';
pub const VISIBLE_SEPARATOR: &str = " | ";
pub const ELLIPSIS: &str = "...";

/// Visible segment plus six hidden fields.
pub const FIELD_COUNT: usize = 7;

/// 1-based field positions as the picker sees them (`{2}`..`{7}`).
pub mod field {
    pub const VISIBLE: usize = 1;
    pub const NAME: usize = 2;
    pub const TYPE: usize = 3;
    pub const RESOURCE_GROUP: usize = 4;
    pub const SUBSCRIPTION: usize = 5;
    pub const LOCATION: usize = 6;
    pub const ID: usize = 7;
}

/// Shorten `s` to at most `budget` characters.
///
/// Budgets of 1-3 cut hard; larger budgets end in `...` when anything was
/// removed. Never splits a multi-byte character.
pub fn truncate(s: &str, budget: isize) -> Cow<'_, str> {
    if budget <= 0 {
        return Cow::Borrowed("");
    }
    let budget = budget as usize;
    let len = s.chars().count();
    if len <= budget {
        return Cow::Borrowed(s);
    }
    if budget <= ELLIPSIS.len() {
        return Cow::Owned(s.chars().take(budget).collect());
    }
    let mut out: String = s.chars().take(budget - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}

/// Last segment of a resource type, e.g. `microsoft.app/containerapps` -> `containerapps`.
pub fn short_type(full: &str) -> &str {
    match full.rfind('/') {
        Some(i) if i + 1 < full.len() => &full[i + 1..],
        _ => full,
    }
}

/// Replace characters that would break line framing.
pub fn sanitize_field(value: &str) -> Cow<'_, str> {
    if value.contains(['\t', '\n', '\r']) {
        Cow::Owned(value.replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

fn pad(out: &mut String, value: &str, width: usize) {
    out.push_str(value);
    let len = value.chars().count();
    for _ in len..width {
        out.push(' ');
    }
}

pub fn visible_segment(r: &Resource, widths: &ColumnWidths) -> String {
    let name = sanitize_field(&r.name);
    let kind = sanitize_field(short_type(&r.resource_type));
    let group = sanitize_field(&r.resource_group);

    let mut out = String::with_capacity(widths.name + widths.kind + widths.group + 6);
    pad(&mut out, &truncate(&name, widths.name as isize), widths.name);
    out.push_str(VISIBLE_SEPARATOR);
    pad(&mut out, &truncate(&kind, widths.kind as isize), widths.kind);
    out.push_str(VISIBLE_SEPARATOR);
    pad(&mut out, &truncate(&group, widths.group as isize), widths.group);
    out
}

/// Hidden fields in protocol order.
fn hidden_fields(r: &Resource) -> [&str; FIELD_COUNT - 1] {
    [
        &r.name,
        &r.resource_type,
        &r.resource_group,
        &r.subscription_id,
        &r.location,
        &r.id,
    ]
}

/// One protocol line, without the trailing newline.
pub fn encode_line(r: &Resource, widths: &ColumnWidths) -> String {
    let mut line = visible_segment(r, widths);
    for value in hidden_fields(r) {
        line.push(FIELD_DELIMITER);
        line.push_str(&sanitize_field(value));
    }
    line
}

/// Full picker input: one newline-terminated line per resource.
pub fn encode_payload(resources: &[Resource], widths: &ColumnWidths) -> String {
    let mut buf = String::new();
    for r in resources {
        let _ = writeln!(buf, "{}", encode_line(r, widths));
    }
    buf
}

/// Hidden fields recovered from a chosen line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine<'a> {
    pub name: &'a str,
    pub resource_type: &'a str,
    pub resource_group: &'a str,
    pub subscription_id: &'a str,
    pub location: &'a str,
    pub id: &'a str,
}

/// Split a picker output line. `None` for empty or short lines.
pub fn parse_line(output: &str) -> Option<DecodedLine<'_>> {
    // Only line terminators are stripped: a trailing tab is an empty id field.
    let line = output.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() {
        return None;
    }
    let parts: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if parts.len() < FIELD_COUNT {
        return None;
    }
    let at = |pos: usize| parts[pos - 1];
    Some(DecodedLine {
        name: at(field::NAME),
        resource_type: at(field::TYPE),
        resource_group: at(field::RESOURCE_GROUP),
        subscription_id: at(field::SUBSCRIPTION),
        location: at(field::LOCATION),
        id: at(field::ID),
    })
}

/// Resolve a picker output line back to one of `resources`.
///
/// Returns `None` for empty output, malformed lines and lines that match
/// nothing. Never guesses.
pub fn decode_selection<'r>(output: &str, resources: &'r [Resource]) -> Option<&'r Resource> {
    let decoded = parse_line(output)?;

    let by_id = resources.iter().find(|r| {
        sanitize_field(&r.id) == decoded.id
            && sanitize_field(&r.subscription_id) == decoded.subscription_id
    });
    if by_id.is_some() {
        return by_id;
    }

    resources.iter().find(|r| {
        sanitize_field(&r.name) == decoded.name
            && sanitize_field(&r.resource_type) == decoded.resource_type
            && sanitize_field(&r.resource_group) == decoded.resource_group
            && sanitize_field(&r.subscription_id) == decoded.subscription_id
    })
}

/// fzf `--preview` template rendering the hidden fields.
pub fn preview_template() -> String {
    format!(
        "printf 'Type:            %s\\nName:            %s\\nSubscription:    %s\\nResource group:  %s\\nLocation:        %s\\nID:              %s\\n' {{{}}} {{{}}} {{{}}} {{{}}} {{{}}} {{{}}}",
        field::TYPE,
        field::NAME,
        field::SUBSCRIPTION,
        field::RESOURCE_GROUP,
        field::LOCATION,
        field::ID,
    )
}
