//! Counter demo: mounts a counter, clicks it and prints the document.
//!
//! Run with `cargo run --example counter`.

use workframe::scheduler;
use workframe::{
    component, define, element, json, mount, render, text, Attrs, Document, Event, Update,
};

fn main() -> anyhow::Result<()> {
    let label = define("Label", |ctx| {
        ctx.on_render(|state| {
            println!("label shows {}", state.get("count").cloned().unwrap_or_default());
            Ok(())
        });
        render(|state, _children| {
            let count = state.get("count").cloned().unwrap_or_default();
            element("span", Attrs::new().attr("class", "count"), vec![text(count)])
        })
    });

    let counter = define("Counter", move |ctx| {
        let state = ctx.state().clone();
        ctx.on_mount(|state| {
            println!("mounted with {}", json!(state));
            Ok(())
        });

        let label = label.clone();
        render(move |current, _children| {
            let state = state.clone();
            let count = current.get("count").cloned().unwrap_or_default();
            element(
                "button",
                Attrs::new().on("onClick", move |_event| {
                    let bumped = Update::with(|n| json!(n.as_i64().unwrap_or(0) + 1));
                    if let Err(err) = state.set_field("count", bumped) {
                        eprintln!("click failed: {err}");
                    }
                }),
                vec![text("Clicked "), component(&label, Attrs::new().attr("count", count), vec![])?],
            )
        })
    });

    let doc = Document::new();
    let app = doc.create_element("div");
    doc.set_attribute(app, "id", "app")?;
    doc.append_child(doc.body(), app)?;

    let handle = mount(&doc, &counter, "#app", json!({"count": 0}))?;
    scheduler::tick()?;

    let button = doc
        .query_selector("button")?
        .ok_or_else(|| anyhow::anyhow!("button not rendered"))?;
    for _ in 0..3 {
        doc.dispatch_event(button, Event::new("click"))?;
        scheduler::tick()?;
    }

    println!("{}", doc.outer_html(doc.body()));
    handle.unmount()?;
    Ok(())
}
