use azfind::core::config::ColumnWidths;
use azfind::core::error::AzfError;
use azfind::core::resource::Resource;
use azfind::plugins::picker::{self, Picker, PickerOutput, Selection, select_resource};
use azfind::plugins::selector::{
    self, FIELD_COUNT, decode_selection, encode_line, encode_payload, visible_segment,
};
use std::cell::RefCell;

fn resource(id: &str, name: &str, sub: &str) -> Resource {
    Resource {
        id: id.to_string(),
        name: name.to_string(),
        resource_type: "Microsoft.Web/sites".to_string(),
        subscription_id: sub.to_string(),
        resource_group: "rg-shared".to_string(),
        location: "westeurope".to_string(),
        tenant_id: "t1".to_string(),
        updated_at: None,
    }
}

/// Picker that echoes back the payload line at `index`, recording what it saw.
struct EchoPicker {
    index: usize,
    seen_query: RefCell<Option<String>>,
}

impl Picker for EchoPicker {
    fn pick(&self, payload: &str, initial_query: &str) -> Result<PickerOutput, AzfError> {
        *self.seen_query.borrow_mut() = Some(initial_query.to_string());
        let line = payload.lines().nth(self.index).unwrap_or_default();
        Ok(PickerOutput::Chosen(format!("{line}\n")))
    }
}

struct FixedPicker(PickerOutput);

impl Picker for FixedPicker {
    fn pick(&self, _payload: &str, _initial_query: &str) -> Result<PickerOutput, AzfError> {
        Ok(self.0.clone())
    }
}

struct BrokenPicker;

impl Picker for BrokenPicker {
    fn pick(&self, _payload: &str, _initial_query: &str) -> Result<PickerOutput, AzfError> {
        Err(AzfError::SelectorError {
            program: "fzf".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
        })
    }
}

#[test]
fn payload_has_one_line_per_resource_with_seven_fields() {
    let widths = ColumnWidths::default();
    let items = vec![resource("/a", "alpha", "s1"), resource("/b", "beta", "s1")];
    let payload = encode_payload(&items, &widths);

    assert!(payload.ends_with('\n'));
    let lines: Vec<&str> = payload.lines().collect();
    assert_eq!(lines.len(), 2);
    for (line, r) in lines.iter().zip(&items) {
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), FIELD_COUNT);
        assert_eq!(
            &fields[1..],
            &[
                r.name.as_str(),
                r.resource_type.as_str(),
                r.resource_group.as_str(),
                r.subscription_id.as_str(),
                r.location.as_str(),
                r.id.as_str()
            ]
        );
    }
    assert!(!payload.contains("\n\n"));
}

#[test]
fn visible_segment_uses_short_type_and_truncation() {
    let widths = ColumnWidths {
        name: 8,
        kind: 5,
        group: 4,
    };
    let mut r = resource("/x", "very-long-name", "s");
    r.resource_group = "rg".into();
    assert_eq!(visible_segment(&r, &widths), "very-... | sites | rg  ");
}

#[test]
fn echo_round_trip_resolves_identical_visible_segments_by_id() {
    let widths = ColumnWidths::default();
    let long_prefix = "x".repeat(60);
    let a = resource("/subs/s1/a", &format!("{long_prefix}-a"), "s1");
    let b = resource("/subs/s1/b", &format!("{long_prefix}-b"), "s1");
    assert_eq!(visible_segment(&a, &widths), visible_segment(&b, &widths));

    let items = vec![a.clone(), b.clone()];
    for (index, expected) in items.iter().enumerate() {
        let p = EchoPicker {
            index,
            seen_query: RefCell::new(None),
        };
        let got = select_resource(&p, &items, "xx", &widths).expect("select");
        assert_eq!(got, Selection::Selected(expected.clone()));
        assert_eq!(p.seen_query.borrow().as_deref(), Some("xx"));
    }
}

#[test]
fn same_name_in_different_subscriptions_resolves_by_subscription() {
    let widths = ColumnWidths::default();
    let mut a = resource("/shared-id", "api", "s1");
    let mut b = resource("/shared-id", "api", "s2");
    a.location = "eastus".into();
    b.location = "westus".into();
    let items = vec![a, b.clone()];

    let line = encode_line(&b, &widths);
    assert_eq!(decode_selection(&line, &items), Some(&b));
}

#[test]
fn falls_back_to_name_type_group_subscription() {
    let widths = ColumnWidths::default();
    let r = resource("/real-id", "api", "s1");
    let mut line = encode_line(&r, &widths);
    // Simulate a picker that mangled the id column.
    line = line.replace("/real-id", "/other-id");

    assert_eq!(decode_selection(&line, std::slice::from_ref(&r)), Some(&r));
}

#[test]
fn unknown_line_is_not_guessed() {
    let widths = ColumnWidths::default();
    let known = resource("/a", "alpha", "s1");
    let stranger = resource("/z", "zulu", "s9");
    let line = encode_line(&stranger, &widths);

    assert_eq!(decode_selection(&line, std::slice::from_ref(&known)), None);
}

#[test]
fn malformed_and_empty_output_decode_to_nothing() {
    let items = vec![resource("/a", "alpha", "s1")];
    assert_eq!(decode_selection("", &items), None);
    assert_eq!(decode_selection("   \n", &items), None);
    assert_eq!(decode_selection("alpha\tMicrosoft.Web/sites\trg", &items), None);
}

#[test]
fn empty_id_survives_line_framing() {
    let widths = ColumnWidths::default();
    let r = resource("", "nameless-id", "s1");
    let line = format!("{}\n", encode_line(&r, &widths));
    assert_eq!(decode_selection(&line, std::slice::from_ref(&r)), Some(&r));
}

#[test]
fn tabs_and_newlines_in_fields_do_not_break_framing() {
    let widths = ColumnWidths::default();
    let mut r = resource("/tabby", "bad\tname\nwith breaks", "s1");
    r.resource_group = "rg\r\n".into();
    let other = resource("/plain", "bad name with breaks", "s1");
    let items = vec![other, r.clone()];

    let payload = encode_payload(&items, &widths);
    assert_eq!(payload.lines().count(), 2);
    let line = payload.lines().nth(1).expect("second line");
    assert_eq!(line.split('\t').count(), FIELD_COUNT);
    assert_eq!(decode_selection(line, &items), Some(&r));
}

#[test]
fn cancellation_paths_are_values_not_errors() {
    let widths = ColumnWidths::default();
    let items = vec![resource("/a", "alpha", "s1"), resource("/b", "beta", "s1")];

    let aborted = FixedPicker(PickerOutput::Aborted(Some(130)));
    assert_eq!(
        select_resource(&aborted, &items, "", &widths).expect("aborted"),
        Selection::Cancelled
    );

    let empty = FixedPicker(PickerOutput::Chosen(String::new()));
    assert_eq!(
        select_resource(&empty, &items, "", &widths).expect("empty"),
        Selection::Cancelled
    );

    let garbage = FixedPicker(PickerOutput::Chosen("not a protocol line\n".into()));
    assert_eq!(
        select_resource(&garbage, &items, "", &widths).expect("garbage"),
        Selection::Cancelled
    );
}

#[test]
fn spawn_failure_is_an_error() {
    let widths = ColumnWidths::default();
    let items = vec![resource("/a", "alpha", "s1")];
    let err = select_resource(&BrokenPicker, &items, "", &widths).expect_err("error");
    assert!(matches!(err, AzfError::SelectorError { .. }));
}

#[test]
fn empty_resource_set_never_launches_picker() {
    let widths = ColumnWidths::default();
    assert_eq!(
        select_resource(&BrokenPicker, &[], "", &widths).expect("no launch"),
        Selection::Cancelled
    );
}

#[test]
fn resolve_maps_chosen_line() {
    let widths = ColumnWidths::default();
    let r = resource("/a", "alpha", "s1");
    let out = PickerOutput::Chosen(format!("{}\n", selector::encode_line(&r, &widths)));
    assert_eq!(
        picker::resolve(out, std::slice::from_ref(&r)),
        Selection::Selected(r)
    );
}

/// Serializes tests that write and exec picker scripts; a concurrent fork
/// holding the script open for writing makes exec fail with ETXTBSY.
#[cfg(unix)]
fn script_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(unix)]
fn script_picker(dir: &std::path::Path, body: &str) -> azfind::plugins::picker::FzfPicker {
    use azfind::core::config::SelectorConfig;
    use azfind::plugins::picker::FzfPicker;
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-fzf");
    std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = std::fs::metadata(&script).expect("meta").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).expect("chmod");

    FzfPicker::new(SelectorConfig {
        program: script.to_string_lossy().into_owned(),
        ..SelectorConfig::default()
    })
}

#[cfg(unix)]
#[test]
fn external_picker_process_round_trip() {
    let _guard = script_lock();
    // Ignores fzf flags and prints the second input line.
    let tmp = tempfile::tempdir().expect("tempdir");
    let p = script_picker(tmp.path(), "sed -n 2p");

    let widths = ColumnWidths::default();
    let items = vec![resource("/a", "alpha", "s1"), resource("/b", "beta", "s1")];
    let got = select_resource(&p, &items, "be", &widths).expect("select");
    assert_eq!(got, Selection::Selected(items[1].clone()));
}

#[cfg(unix)]
#[test]
fn streaming_picker_with_large_payload_does_not_stall() {
    let _guard = script_lock();
    // Echoes input as it reads, so its stdout fills while stdin is still open.
    let tmp = tempfile::tempdir().expect("tempdir");
    let p = script_picker(tmp.path(), "cat");

    let line = format!("{}\n", "x".repeat(99));
    let payload = line.repeat(2_000);
    assert!(payload.len() > 64 * 1024);

    let out = p.pick(&payload, "").expect("pick");
    assert_eq!(out, PickerOutput::Chosen(payload));
}
