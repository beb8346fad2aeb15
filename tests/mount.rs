//! Mounting, update-by-action and hook counts through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use workframe::scheduler::{self, reset_scheduler};
use workframe::{
    define, element, json, mount, mount_with_updater, render, reset_registry, text, Action, Attrs,
    ComponentType, Document, Event, State, Value, WorkframeError,
};

fn setup() -> Document {
    reset_registry();
    reset_scheduler();
    let doc = Document::new();
    let app = doc.create_element("div");
    doc.set_attribute(app, "id", "app").unwrap();
    let placeholder = doc.create_text("loading");
    doc.append_child(app, placeholder).unwrap();
    doc.append_child(doc.body(), app).unwrap();
    doc
}

fn field(state: &State, name: &str) -> Value {
    state.get(name).cloned().unwrap_or_default()
}

fn name_div() -> ComponentType {
    define("NameDiv", |_ctx| {
        render(|state, _children| element("div", Attrs::new(), vec![text(field(state, "name"))]))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Msg {
    Rename,
}

#[test]
fn test_updater_changes_text_and_keeps_element() {
    let doc = setup();
    let dispatcher = mount_with_updater(
        &doc,
        &name_div(),
        "#app",
        json!({"name": "X"}),
        |state: &State, action: &Action<Msg>| {
            let mut next = state.clone();
            if action.kind == Msg::Rename {
                next.insert("name".to_string(), action.data.clone().unwrap_or_default());
            }
            next
        },
    )
    .unwrap();

    let div = dispatcher.handle().root_element().unwrap();
    assert!(doc.query_selector("#app").unwrap().is_none());
    assert_eq!(doc.tag_name(div).as_deref(), Some("div"));
    assert_eq!(doc.text_content(div), "X");

    let state = dispatcher.dispatch(Action::with_data(Msg::Rename, "Y")).unwrap();
    assert_eq!(state["name"], json!("Y"));
    assert_eq!(dispatcher.handle().root_element(), Some(div));
    assert!(doc.contains(div));
    assert_eq!(doc.text_content(div), "Y");
    assert_eq!(dispatcher.handle().state().get("name"), Some(json!("Y")));
}

#[test]
fn test_unchanged_dispatch_leaves_document_alone() {
    let doc = setup();
    let dispatcher = mount_with_updater(
        &doc,
        &name_div(),
        "#app",
        json!({"name": "X"}),
        |state: &State, _action: &Action<Msg>| state.clone(),
    )
    .unwrap();
    let before = doc.outer_html(doc.root());

    dispatcher.dispatch(Action::new(Msg::Rename)).unwrap();
    assert_eq!(doc.outer_html(doc.root()), before);
}

#[test]
fn test_target_not_found_mutates_nothing() {
    let doc = setup();
    let html = doc.outer_html(doc.root());
    let nodes = doc.node_count();

    let err = mount(&doc, &name_div(), "#missing", json!({"name": "X"})).unwrap_err();
    assert!(matches!(err, WorkframeError::TargetNotFound(_)));
    assert_eq!(doc.outer_html(doc.root()), html);
    assert_eq!(doc.node_count(), nodes);
    assert_eq!(scheduler::pending_jobs(), 0);
}

#[test]
fn test_mount_once_render_per_changing_set() {
    let doc = setup();
    let log = Rc::new(RefCell::new(Vec::new()));

    let sink = log.clone();
    let counter = define("Counter", move |ctx| {
        let mounts = sink.clone();
        ctx.on_mount(move |_| {
            mounts.borrow_mut().push("mount".to_string());
            Ok(())
        });
        let renders = sink.clone();
        ctx.on_render(move |state| {
            renders.borrow_mut().push(format!("render {}", field(state, "count")));
            Ok(())
        });
        render(|state, _children| element("p", Attrs::new(), vec![text(field(state, "count"))]))
    });

    let handle = mount(&doc, &counter, "#app", json!({"count": 0})).unwrap();
    assert!(log.borrow().is_empty());
    scheduler::tick().unwrap();

    for n in 1..=3 {
        handle.state().set_field("count", n).unwrap();
        scheduler::tick().unwrap();
    }

    assert_eq!(
        *log.borrow(),
        vec!["mount", "render 0", "render 1", "render 2", "render 3"]
    );
    assert_eq!(log.borrow().iter().filter(|entry| entry.as_str() == "mount").count(), 1);
}

#[test]
fn test_click_handler_sets_state() {
    let doc = setup();
    let counter = define("Clicker", |ctx| {
        let state = ctx.state().clone();
        render(move |current, _children| {
            let state = state.clone();
            element(
                "button",
                Attrs::new().on("onClick", move |_event| {
                    let next = state.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
                    state.set_field("count", next).unwrap();
                }),
                vec![text(field(current, "count"))],
            )
        })
    });

    let handle = mount(&doc, &counter, "#app", json!({"count": 0})).unwrap();
    let button = handle.root_element().unwrap();

    doc.dispatch_event(button, Event::new("click")).unwrap();
    doc.dispatch_event(button, Event::new("click")).unwrap();
    assert_eq!(doc.text_content(button), "2");
    assert_eq!(handle.root_element(), Some(button));
}

#[test]
fn test_second_mount_is_independent() {
    let doc = setup();
    let other = doc.create_element("section");
    doc.set_attribute(other, "class", "second").unwrap();
    doc.append_child(doc.body(), other).unwrap();

    let first = mount(&doc, &name_div(), "#app", json!({"name": "a"})).unwrap();
    let second = mount(&doc, &name_div(), ".second", json!({"name": "b"})).unwrap();
    assert_ne!(first.root_component(), second.root_component());

    second.state().set_field("name", "c").unwrap();
    assert_eq!(doc.text_content(first.root_element().unwrap()), "a");
    assert_eq!(doc.text_content(second.root_element().unwrap()), "c");

    first.unmount().unwrap();
    assert_eq!(doc.children(doc.body()), vec![second.root_element().unwrap()]);
}

#[test]
fn test_app_keeps_working_after_handle_is_dropped() {
    let doc = setup();
    let clicker = define("Clicker", |ctx| {
        let state = ctx.state().clone();
        render(move |current, _children| {
            let state = state.clone();
            element(
                "button",
                Attrs::new().on("onClick", move |_event| {
                    let next = state.get("count").and_then(|v| v.as_i64()).unwrap_or(0) + 1;
                    state.set_field("count", next).unwrap();
                }),
                vec![text(field(current, "count"))],
            )
        })
    });

    {
        let _handle = mount(&doc, &clicker, "#app", json!({"count": 0})).unwrap();
    }
    scheduler::tick().unwrap();
    assert_eq!(workframe::engine::root_count(), 1);

    let button = doc.query_selector("button").unwrap().unwrap();
    doc.dispatch_event(button, Event::new("click")).unwrap();
    assert_eq!(doc.text_content(button), "1");
}

#[test]
fn test_unmounted_component_cannot_be_rendered() {
    let doc = setup();
    let handle = mount(&doc, &name_div(), "#app", json!({"name": "X"})).unwrap();
    let id = handle.root_component();
    handle.unmount().unwrap();

    assert_eq!(workframe::engine::root_count(), 0);
    let err = workframe::pipeline::render_component(id).unwrap_err();
    assert!(matches!(err, WorkframeError::InvalidArgument(_)));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Pass,
}

#[test]
fn test_updater_can_remove_fields() {
    let doc = setup();
    let status = define("Status", |_ctx| {
        render(|state, _children| {
            let shown = match (state.get("error"), state.get("ok")) {
                (Some(error), _) => error.clone(),
                (None, Some(_)) => json!("fine"),
                (None, None) => json!("unknown"),
            };
            element("p", Attrs::new(), vec![text(shown)])
        })
    });

    let dispatcher = mount_with_updater(
        &doc,
        &status,
        "#app",
        json!({"error": "bad"}),
        |state: &State, action: &Action<Check>| {
            let mut next = state.clone();
            if action.kind == Check::Pass {
                next.remove("error");
                next.insert("ok".to_string(), json!(true));
            }
            next
        },
    )
    .unwrap();
    let p = dispatcher.handle().root_element().unwrap();
    assert_eq!(doc.text_content(p), "bad");

    let state = dispatcher.dispatch(Action::new(Check::Pass)).unwrap();
    assert_eq!(Value::Object(state), json!({"ok": true}));
    assert_eq!(doc.text_content(p), "fine");
    assert_eq!(dispatcher.handle().state().get("error"), None);
}
