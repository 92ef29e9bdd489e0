use anyhow::Result;
use canvas_manipulator::{
    Document, DragMode, DragOptions, EventKind, Manipulator, ManipulatorConfig, Point, PointerInput, Rect,
    ResizeHandle, ResizeOptions, StyleProps, StyleTarget, Viewport,
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn style(pairs: &[(&str, &str)]) -> StyleProps {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn print_style(label: &str, props: &StyleProps) {
    println!("  {label}:");
    for (key, value) in props {
        println!("    {key}: {value}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Canvas Manipulator - drag & resize demo");
    println!("=======================================\n");

    let config = match std::env::args().nth(1) {
        Some(path) => ManipulatorConfig::load(Path::new(&path))?,
        None => ManipulatorConfig::default(),
    };
    config.validate()?;

    let mut document = Document::with_root(Viewport::new(1280.0, 1000.0), Rect::new(0.0, 0.0, 1280.0, 1200.0));
    let root = document
        .root()
        .ok_or_else(|| anyhow::anyhow!("document has no root"))?;
    let section = document.add_component(
        root,
        Rect::new(0.0, 0.0, 1000.0, 1000.0),
        style(&[("position", "relative")]),
    )?;
    let sidebar = document.add_component(
        section,
        Rect::new(200.0, 0.0, 100.0, 100.0),
        style(&[("position", "absolute"), ("left", "200px"), ("top", "0px")]),
    )?;
    let card = document.add_component(
        section,
        Rect::new(100.0, 200.0, 50.0, 50.0),
        style(&[("width", "auto")]),
    )?;
    document.set_drag_mode(card, Some(DragMode::Absolute))?;

    println!("✓ Built document with {} components", document.component_count());
    println!("  sidebar right edge at x=300");

    let mut manipulator = Manipulator::new(config);

    // Drag the card so its left edge lands two pixels short of the sidebar
    manipulator.start_drag(&mut document, DragOptions::new(card, Point::new(120.0, 220.0)))?;
    for x in [160.0, 240.0, 300.0, 318.0] {
        manipulator.pointer_move(&mut document, PointerInput::at(x, 220.0))?;
    }
    let outcome = manipulator.pointer_up(&mut document)?;

    println!("\n✓ Dragged card (moved: {})", outcome.moved);
    print_style("card style", &document.get_style(card));
    let matched = document.events().iter().rev().find_map(|e| match &e.event {
        EventKind::DragActive { matched, .. } => Some(matched.clone()),
        _ => None,
    });
    if let Some(matched) = matched {
        println!(
            "  guide {:?} matched {:?} of {} (gap {})",
            matched.guide.kind,
            matched.matched.kind,
            if matched.matched.owner == sidebar { "sidebar" } else { "other" },
            matched.label()
        );
    }

    // Resize from the bottom-right grip
    manipulator.start_resize(
        &mut document,
        ResizeOptions::new(card, ResizeHandle::BottomRight, Point::new(350.0, 250.0)),
    )?;
    manipulator.pointer_move(&mut document, PointerInput::at(380.0, 270.0))?;
    manipulator.pointer_move(&mut document, PointerInput::at(410.0, 290.0))?;
    let outcome = manipulator.pointer_up(&mut document)?;

    println!("\n✓ Resized card (moved: {})", outcome.moved);
    print_style("card style", &document.get_style(card));

    println!("\n📊 Session log:");
    println!("  └─ Style writes: {}", document.style_writes().len());
    println!("  └─ History entries: {}", document.history().len());
    println!("  └─ Events emitted: {}", document.events().len());
    for entry in document.history() {
        println!(
            "     {} {:?}",
            entry.timestamp.format("%H:%M:%S%.3f"),
            entry.props
        );
    }

    Ok(())
}
