use std::cell::Cell;
use std::time::{Duration, Instant};

use oxidize_page_viewer::{
    persist_rotation, ConfigError, CursorAffordance, DocumentRef, PageImage, PersistenceError,
    Point, RotationAngle, RotationCompletion, RotationDirection, RotationPersistence, ScaleMode,
    ScrollOffset, Size, ViewerConfig, ViewerController, ViewerEffect, ViewerState, Viewport,
    WheelEvent,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("oxidize_page_viewer=debug")
        .with_test_writer()
        .try_init();
}

fn images(count: usize) -> Vec<PageImage> {
    (0..count)
        .map(|i| PageImage::new(format!("scan-{}.jpg", i + 1)))
        .collect()
}

/// Square pages of `side` pixels, all loaded, shown at natural size
fn loaded_viewer(page_count: usize, side: f32, viewport: Viewport) -> ViewerController {
    init_tracing();
    let mut viewer = ViewerController::new(ViewerConfig::default(), viewport).unwrap();
    viewer.load_document(DocumentRef::new("dossier-a", 100), images(page_count));
    viewer.set_scale_mode(ScaleMode::Numeric(1.0));
    for index in 0..page_count {
        viewer.on_image_loaded(index, Size::new(side, side));
    }
    viewer
}

#[test]
fn scroll_settling_on_mostly_visible_second_page_selects_it() {
    let mut viewer = loaded_viewer(3, 1000.0, Viewport::new(1000.0, 1000.0));
    let start = Instant::now();

    viewer.on_scroll(ScrollOffset::new(0.0, 700.0), start);
    assert_eq!(viewer.tick(start + Duration::from_millis(299)), None);
    assert_eq!(viewer.tick(start + Duration::from_millis(300)), Some(2));

    assert_eq!(viewer.state().current_page, 2);
    assert_eq!(viewer.state().page_number_input, "2");
}

#[test]
fn scroll_burst_is_evaluated_once() {
    let mut viewer = loaded_viewer(4, 500.0, Viewport::new(600.0, 500.0));
    let start = Instant::now();

    for (step, top) in [100.0, 400.0, 900.0, 1400.0].into_iter().enumerate() {
        let at = start + Duration::from_millis(100 * step as u64);
        viewer.on_scroll(ScrollOffset::new(0.0, top), at);
        assert_eq!(viewer.tick(at), None);
    }

    let settled = viewer.next_deadline().unwrap();
    assert_eq!(settled, start + Duration::from_millis(600));
    assert_eq!(viewer.tick(settled), Some(4));
    assert_eq!(viewer.tick(settled + Duration::from_secs(1)), None);
}

#[test]
fn set_page_scrolls_target_to_top() {
    let mut viewer = loaded_viewer(5, 400.0, Viewport::new(500.0, 400.0));
    viewer.on_scroll(ScrollOffset::new(35.0, 0.0), Instant::now());

    let effects = viewer.set_page("4");

    assert_eq!(effects, vec![ViewerEffect::ScrollTo(ScrollOffset::new(35.0, 1200.0))]);
    assert_eq!(viewer.state().current_page, 4);
    assert_eq!(viewer.state().page_number_input, "4");
}

#[test]
fn page_gap_is_part_of_the_jump_target() {
    init_tracing();
    let config = ViewerConfig::from_json(r#"{ "page_gap": 16.0 }"#).unwrap();
    let mut viewer = ViewerController::new(config, Viewport::new(500.0, 400.0)).unwrap();
    viewer.load_document(DocumentRef::new("gapped", 1), images(3));
    viewer.set_scale_mode(ScaleMode::Numeric(0.5));
    for index in 0..3 {
        viewer.on_image_loaded(index, Size::new(400.0, 600.0));
    }

    assert_eq!(
        viewer.jump_to_page(3),
        vec![ViewerEffect::ScrollTo(ScrollOffset::new(0.0, 632.0))]
    );
}

#[test]
fn invalid_page_input_only_blurs() {
    let mut viewer = loaded_viewer(3, 100.0, Viewport::new(200.0, 100.0));
    viewer.set_page_number_input("9");
    let before = viewer.state().clone();

    for input in ["9", "0", "", "two", "1.5"] {
        assert_eq!(viewer.set_page(input), vec![ViewerEffect::BlurFocus]);
    }
    assert_eq!(viewer.state(), &before);
}

proptest! {
    #[test]
    fn set_page_lands_on_any_valid_page(target in 0usize..12) {
        let mut viewer = loaded_viewer(7, 300.0, Viewport::new(400.0, 300.0));
        let before = viewer.state().clone();

        let effects = viewer.set_page(&target.to_string());

        if (1..=7).contains(&target) {
            prop_assert_eq!(viewer.state().current_page, target);
            let expected_top = (target - 1) as f32 * 300.0;
            prop_assert_eq!(
                effects,
                vec![ViewerEffect::ScrollTo(ScrollOffset::new(0.0, expected_top))]
            );
        } else {
            prop_assert_eq!(viewer.state(), &before);
            prop_assert_eq!(effects, vec![ViewerEffect::BlurFocus]);
        }
    }
}

#[test]
fn document_change_resets_viewer() {
    let mut viewer = loaded_viewer(3, 1000.0, Viewport::new(1000.0, 1000.0));
    viewer.set_page("3");
    viewer.set_scale_mode(ScaleMode::Numeric(1.5));
    let pending = viewer.rotate(1, RotationDirection::Clockwise).unwrap();
    viewer.pointer_down(Point::new(10.0, 10.0));
    assert_eq!(viewer.rotation(0), RotationAngle::Deg90);
    assert_eq!(viewer.state().scale_numeric, 1.5);

    let effects = viewer.load_document(DocumentRef::new("dossier-b", 200), images(4));

    assert_eq!(
        effects,
        vec![
            ViewerEffect::SetCursor(CursorAffordance::Default),
            ViewerEffect::ReleasePointer,
            ViewerEffect::ScrollTo(ScrollOffset::ORIGIN),
        ]
    );
    assert_eq!(viewer.state(), &ViewerState::default());
    assert_eq!(viewer.state().scale_mode, ScaleMode::FitWidth);
    assert_eq!(viewer.viewport().scroll_offset(), ScrollOffset::ORIGIN);
    assert!((0..4).all(|index| viewer.rotation(index) == RotationAngle::Deg0));
    assert_eq!(viewer.cursor(), CursorAffordance::Default);

    // the save for the old document no longer matters
    assert_eq!(
        viewer.on_rotation_saved(pending.ticket, Ok(())),
        RotationCompletion::Stale
    );
}

#[test]
fn modification_time_change_counts_as_new_document() {
    let mut viewer = loaded_viewer(2, 100.0, Viewport::new(200.0, 100.0));
    viewer.set_page("2");

    let effects = viewer.load_document(DocumentRef::new("dossier-a", 101), images(2));

    assert_eq!(effects, vec![ViewerEffect::ScrollTo(ScrollOffset::ORIGIN)]);
    assert_eq!(viewer.state().current_page, 1);
}

#[test]
fn drag_pans_inverse_to_pointer() {
    let mut viewer = loaded_viewer(2, 1000.0, Viewport::new(500.0, 500.0));

    assert_eq!(
        viewer.pointer_down(Point::new(100.0, 100.0)),
        vec![
            ViewerEffect::BlurFocus,
            ViewerEffect::SetCursor(CursorAffordance::Grabbing),
            ViewerEffect::CapturePointer,
        ]
    );
    assert_eq!(
        viewer.pointer_move(Point::new(80.0, 70.0)),
        vec![ViewerEffect::ScrollTo(ScrollOffset::new(20.0, 30.0))]
    );
    assert_eq!(viewer.viewport().scroll_offset(), ScrollOffset::new(20.0, 30.0));

    assert_eq!(
        viewer.pointer_up(),
        vec![
            ViewerEffect::SetCursor(CursorAffordance::Default),
            ViewerEffect::ReleasePointer,
        ]
    );
    assert!(viewer.pointer_move(Point::new(0.0, 0.0)).is_empty());
}

#[test]
fn ctrl_wheel_steps_zoom() {
    let mut viewer = loaded_viewer(2, 400.0, Viewport::new(500.0, 400.0));

    let zoom_out = WheelEvent {
        delta_y: 120.0,
        zoom_modifier: true,
    };
    assert_eq!(viewer.on_wheel(zoom_out), vec![ViewerEffect::PreventDefault]);
    let smaller = viewer.state().scale_numeric;
    assert!(smaller < 1.0);
    assert_eq!(viewer.state().scale_mode, ScaleMode::Numeric(smaller));
    assert_eq!(viewer.document().page(1).unwrap().applied_scale(), smaller);

    let zoom_in = WheelEvent {
        delta_y: -120.0,
        zoom_modifier: true,
    };
    viewer.on_wheel(zoom_in);
    assert_eq!(viewer.state().scale_numeric, 1.0);

    let plain = WheelEvent {
        delta_y: 120.0,
        zoom_modifier: false,
    };
    assert!(viewer.on_wheel(plain).is_empty());
    assert_eq!(viewer.state().scale_numeric, 1.0);
}

#[test]
fn wheel_zoom_from_fit_width_snaps_to_table() {
    init_tracing();
    let mut viewer =
        ViewerController::new(ViewerConfig::default(), Viewport::new(1000.0, 800.0)).unwrap();
    viewer.load_document(DocumentRef::new("fit", 1), images(1));
    viewer.on_image_loaded(0, Size::new(900.0, 1200.0));
    let fitted = viewer.state().scale_numeric;
    assert!(fitted > 1.0);

    viewer.on_wheel(WheelEvent {
        delta_y: 1.0,
        zoom_modifier: true,
    });
    assert_eq!(viewer.state().scale_numeric, 1.0);
}

#[test]
fn rotation_keeps_zoom_and_swaps_layout() {
    let mut viewer = loaded_viewer(2, 100.0, Viewport::new(400.0, 300.0));
    viewer.on_image_loaded(0, Size::new(400.0, 200.0));
    viewer.set_scale_mode(ScaleMode::Numeric(1.5));

    let request = viewer.rotate(1, RotationDirection::Clockwise).unwrap();

    assert_eq!(request.page_index, 0);
    assert_eq!(request.angle, RotationAngle::Deg90);
    assert_eq!(request.document, DocumentRef::new("dossier-a", 100));
    assert_eq!(viewer.state().scale_mode, ScaleMode::PreserveOnRotate);
    assert_eq!(viewer.state().scale_numeric, 1.5);
    assert_eq!(viewer.state().rotation_in_flight, Some(RotationDirection::Clockwise));

    let placement = viewer.page_placement(0).unwrap();
    assert_eq!(placement.slot_height, 600.0);
    assert_eq!(placement.offset, Point::new(-150.0, 150.0));

    // page 2 now starts below the quarter-turned first page
    assert_eq!(
        viewer.jump_to_page(2),
        vec![ViewerEffect::ScrollTo(ScrollOffset::new(0.0, 600.0))]
    );

    let toolbar = viewer.toolbar_state();
    assert_eq!(toolbar.zoom_percent, 150);
    assert_eq!(toolbar.page_count, 2);

    viewer.on_rotation_saved(request.ticket, Ok(()));
    assert_eq!(viewer.state().rotation_in_flight, None);
    assert_eq!(viewer.rotation(0), RotationAngle::Deg90);
}

#[test]
fn page_loading_after_rotation_keeps_users_zoom() {
    init_tracing();
    let mut viewer =
        ViewerController::new(ViewerConfig::default(), Viewport::new(1000.0, 800.0)).unwrap();
    viewer.load_document(DocumentRef::new("late", 1), images(2));
    viewer.on_image_loaded(0, Size::new(2000.0, 2000.0));
    let fitted = viewer.state().scale_numeric;
    assert_eq!(fitted, 1000.0 * (1.0 - 0.03) / 2000.0);

    viewer.rotate(1, RotationDirection::Clockwise).unwrap();
    assert_eq!(viewer.state().scale_mode, ScaleMode::PreserveOnRotate);

    assert!(viewer.on_image_loaded(1, Size::new(2000.0, 2000.0)));
    assert_eq!(viewer.document().page(1).unwrap().applied_scale(), fitted);
    assert_eq!(viewer.page_placement(1).unwrap().slot_height, 2000.0 * fitted);
}

#[test]
fn zoomed_in_pages_loading_late_match_the_zoom() {
    init_tracing();
    let mut viewer =
        ViewerController::new(ViewerConfig::default(), Viewport::new(600.0, 500.0)).unwrap();
    viewer.load_document(DocumentRef::new("late", 1), images(3));
    viewer.on_image_loaded(0, Size::new(500.0, 500.0));
    viewer.set_scale_mode(ScaleMode::Numeric(2.0));
    viewer.rotate(1, RotationDirection::CounterClockwise).unwrap();

    viewer.on_image_loaded(2, Size::new(300.0, 400.0));

    assert_eq!(viewer.document().page(2).unwrap().applied_scale(), 2.0);
    assert_eq!(viewer.toolbar_state().zoom_percent, 200);
}

#[test]
fn zero_zoom_minimum_is_rejected_up_front() {
    init_tracing();
    let mut config = ViewerConfig::default();
    config.zoom.min = 0.0;

    let result = ViewerController::new(config, Viewport::new(800.0, 600.0));

    assert!(matches!(
        result,
        Err(ConfigError::Invalid {
            field: "zoom.min",
            ..
        })
    ));
}

struct FlakyService {
    calls: Cell<usize>,
}

impl RotationPersistence for FlakyService {
    async fn save_rotation(
        &self,
        _document: &DocumentRef,
        _page_index: usize,
        _angle: RotationAngle,
    ) -> Result<(), PersistenceError> {
        self.calls.set(self.calls.get() + 1);
        Err(PersistenceError::Transport("connection reset".into()))
    }
}

#[tokio::test]
async fn failed_save_reverts_rotation_and_reports_it() {
    let mut viewer = loaded_viewer(3, 200.0, Viewport::new(300.0, 200.0));
    let service = FlakyService {
        calls: Cell::new(0),
    };

    let request = viewer.rotate(3, RotationDirection::CounterClockwise).unwrap();
    assert_eq!(viewer.rotation(2), RotationAngle::Deg270);

    let result = persist_rotation(&service, &request, viewer.rotation_save_timeout()).await;
    let completion = viewer.on_rotation_saved(request.ticket, result);

    assert_eq!(service.calls.get(), 1);
    assert_eq!(completion, RotationCompletion::Failed { reverted: true });
    assert_eq!(viewer.rotation(2), RotationAngle::Deg0);
    assert_eq!(viewer.state().rotation_in_flight, None);

    let error = viewer.toolbar_state().rotation_error.unwrap();
    assert_eq!(error.page_index, 2);
    assert_eq!(error.restored, Some(RotationAngle::Deg0));
    assert!(error.message.contains("connection reset"));

    assert!(viewer.dismiss_rotation_error().is_some());
    assert_eq!(viewer.toolbar_state().rotation_error, None);
}

#[test]
fn resize_refits_pages() {
    init_tracing();
    let mut viewer =
        ViewerController::new(ViewerConfig::default(), Viewport::new(500.0, 400.0)).unwrap();
    viewer.load_document(DocumentRef::new("resize", 1), images(1));
    viewer.on_image_loaded(0, Size::new(1000.0, 1000.0));
    let narrow = viewer.state().scale_numeric;

    viewer.on_viewport_resized(1000.0, 400.0);

    assert_eq!(viewer.state().scale_numeric, narrow * 2.0);
    assert_eq!(viewer.state().scale_mode, ScaleMode::FitWidth);
}
