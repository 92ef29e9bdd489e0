mod fixtures;

use canvas_manipulator::guides::{collect_static_guides, compute_guides, match_guides, RectArena};
use canvas_manipulator::{
    to_unit, ConvertOptions, Guide, GuideKind, MeasuredRect, Rect, UnitContext, Viewport,
};
use fixtures::sample_documents::{create_row, create_snap_scene};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use ulid::Ulid;

fn active_guide(owner: Ulid, rect: Rect, kind: GuideKind) -> Guide {
    let mut guide = compute_guides(owner, MeasuredRect::unscaled(rect))
        .into_iter()
        .find(|g| g.kind == kind)
        .unwrap();
    guide.active = true;
    guide
}

fn all_guides(owner: Ulid, rect: Rect) -> Vec<Guide> {
    compute_guides(owner, MeasuredRect::unscaled(rect)).to_vec()
}

proptest! {
    /// A.right on B.left matches from either side at the same coordinate
    #[test]
    fn prop_guide_match_symmetry(
        a_left in 0.0f64..500.0,
        a_width in 2.0f64..200.0,
        a_top in 0.0f64..500.0,
        a_height in 1.0f64..200.0,
        b_width in 1.0f64..200.0,
        b_height in 1.0f64..200.0,
        spacing in 1.0f64..300.0,
    ) {
        let a_rect = Rect::new(a_left, a_top, a_width, a_height);
        let b_rect = Rect::new(a_rect.right(), a_rect.bottom() + spacing, b_width, b_height);
        let (a, b) = (Ulid::new(), Ulid::new());

        let forward = match_guides(
            &[active_guide(a, a_rect, GuideKind::Right)],
            &all_guides(b, b_rect),
            1.0,
        );
        let backward = match_guides(
            &[active_guide(b, b_rect, GuideKind::Left)],
            &all_guides(a, a_rect),
            1.0,
        );

        prop_assert_eq!(forward.len(), 1);
        prop_assert_eq!(backward.len(), 1);
        prop_assert_eq!(forward[0].matched.kind, GuideKind::Left);
        prop_assert_eq!(backward[0].matched.kind, GuideKind::Right);
        prop_assert_eq!(forward[0].pos_first, backward[0].pos_first);
        prop_assert!((forward[0].size - backward[0].size).abs() < 1e-9);
    }

    /// Overlapping elements never produce a spacing readout
    #[test]
    fn prop_overlap_never_matches(
        left in 0.0f64..500.0,
        top in 0.0f64..500.0,
        size in 10.0f64..200.0,
        overlap in 1.0f64..9.0,
    ) {
        let a_rect = Rect::new(left, top, size, size);
        let b_rect = Rect::new(a_rect.right(), top + size - overlap, size, size);
        let matches = match_guides(
            &[active_guide(Ulid::new(), a_rect, GuideKind::Right)],
            &all_guides(Ulid::new(), b_rect),
            1.0,
        );
        prop_assert!(matches.is_empty());
    }
}

#[test]
fn test_static_guides_idempotent() {
    let scene = create_snap_scene();
    let first = collect_static_guides(&scene.document, scene.element, &mut RectArena::new());
    let second = collect_static_guides(&scene.document, scene.element, &mut RectArena::new());
    assert_eq!(first, second);
    assert_eq!(first.len(), 12);
}

#[test]
fn test_static_guides_sibling_order_then_parent() {
    let (document, ids) = create_row(4);
    let mut arena = RectArena::new();
    let guides = collect_static_guides(&document, ids[1], &mut arena);

    let owners: Vec<Ulid> = guides.chunks(6).map(|chunk| chunk[0].owner).collect();
    assert_eq!(owners, vec![ids[0], ids[2], ids[3], document.root().unwrap()]);
    assert_eq!(arena.len(), 4);
}

#[test]
fn test_root_has_no_static_guides() {
    let (document, _) = create_row(2);
    let root = document.root().unwrap();
    assert!(collect_static_guides(&document, root, &mut RectArena::new()).is_empty());
}

#[test]
fn test_nearest_spacing_reported() {
    // Two aligned elements above the target; the readout spans the closer one
    let target = Rect::new(100.0, 300.0, 50.0, 50.0);
    let far = Rect::new(100.0, 0.0, 80.0, 40.0);
    let near = Rect::new(100.0, 200.0, 30.0, 40.0);

    let mut statics = all_guides(Ulid::new(), far);
    let near_id = Ulid::new();
    statics.extend(all_guides(near_id, near));

    let matches = match_guides(&[active_guide(Ulid::new(), target, GuideKind::Left)], &statics, 1.0);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].matched.owner, near_id);
    assert_eq!(matches[0].size, 60.0);
    assert_eq!(matches[0].pos_second, 240.0);
}

#[test]
fn test_unit_examples() {
    let ctx = UnitContext::new(Viewport::new(1280.0, 800.0), 640.0, 400.0);
    let opts = ConvertOptions::default();
    assert_eq!(to_unit(96.0, "in", &ctx, &opts), "1in");
    assert_eq!(to_unit(48.0, "pt", &ctx, &opts), "36pt");
    assert_eq!(to_unit(320.0, "%", &ctx, &opts), "50%");
    assert_eq!(to_unit(100.0, "%", &ctx, &opts.height()), "25%");
    assert_eq!(to_unit(12.5, "furlong", &ctx, &opts), "12.5px");
}
