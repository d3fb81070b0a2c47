use checknote_core::{display_body, to_html, to_json, to_text, ChecklistNote, ListItem};

fn items() -> Vec<ListItem> {
    vec![
        ListItem::new(1, "Groceries <weekly>").with_children(vec![
            ListItem::child(2, "Milk & eggs").with_checked(true),
        ]),
        ListItem::child(2, "Milk & eggs").with_checked(true),
        ListItem::new(3, "Laundry"),
    ]
}

#[test]
fn text_export_puts_title_above_body() {
    let mut note = ChecklistNote::new("Weekend");
    note.items = items();
    assert_eq!(
        to_text(&note),
        "Weekend\n\n[ ] Groceries <weekly>\n    [✓] Milk & eggs\n[ ] Laundry"
    );

    note.title.clear();
    assert_eq!(to_text(&note), display_body(&note.items));
}

#[test]
fn html_export_escapes_and_nests_children() {
    let html = to_html("Tom & Jerry", &items());

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Tom &amp; Jerry</title>"));
    assert!(html.contains(
        "<li><input type=\"checkbox\">Groceries &lt;weekly&gt;\
         <ol style=\"list-style: none;\">\
         <li><input type=\"checkbox\" checked>Milk &amp; eggs</li></ol></li>"
    ));
    assert!(html.contains("<li><input type=\"checkbox\">Laundry</li>"));
    assert_eq!(html.matches("Milk &amp; eggs").count(), 1);
}

#[test]
fn json_export_carries_title_timestamp_and_items() {
    let mut note = ChecklistNote::new("Weekend");
    note.items = items();
    note.updated_at = 1_700_000_000_000;

    let value: serde_json::Value = serde_json::from_str(&to_json(&note).unwrap()).unwrap();
    assert_eq!(value["type"], "LIST");
    assert_eq!(value["title"], "Weekend");
    assert_eq!(value["updated_at"], 1_700_000_000_000_i64);
    assert_eq!(value["items"].as_array().unwrap().len(), 3);
    assert_eq!(value["items"][1]["is_child"], true);
    assert!(value["items"][2].get("children").is_none());
}
