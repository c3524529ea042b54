//! End-to-end tests of the scene controller against the headless host
//!
//! Each test mounts a controller, drives it through scroll, resize and mode
//! changes the way a page would, and checks the animation output and the
//! host registrations it leaves behind.

use crate::animation::{target_zoom, FrameReport};
use crate::input::{Mode, ModeCell, Viewport};
use crate::lifecycle::{FrameToken, HeadlessHost, LifecycleError, SceneController};
use crate::render::RenderBackend;
use crate::scene::{NodeId, SceneGraph};
use crate::settings::{ControllerConfig, ZoomConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const DT: f64 = 1.0 / 60.0;

    fn host() -> HeadlessHost {
        HeadlessHost::new(Viewport::new(1280, 720), 4000.0)
    }

    fn mount(host: &mut HeadlessHost, mode: &ModeCell) -> SceneController<HeadlessHost> {
        SceneController::mount(host, ControllerConfig::default(), mode.reader()).expect("mount")
    }

    fn subtree(graph: &SceneGraph, id: NodeId) -> Vec<NodeId> {
        let mut ids = Vec::new();
        graph.walk(id, &mut |node, _| ids.push(node));
        ids
    }

    fn assert_no_registrations(host: &HeadlessHost) {
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.pending_frame_count(), 0);
        assert_eq!(host.surface_count(), 0);
    }

    #[test]
    fn test_mount_registers_with_host() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        assert!(controller.is_mounted());
        assert_eq!(host.listener_count(), 2);
        assert_eq!(host.pending_frame_count(), 1);
        assert_eq!(host.surface_count(), 1);

        let style = host.surface_styles().next().unwrap();
        assert!(!style.pointer_events);
        assert!(!style.selectable);
        assert_relative_eq!(style.opacity, 0.7);

        controller.unmount(&mut host);
    }

    #[test]
    fn test_unmount_immediately_after_mount() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        controller.unmount(&mut host);
        assert!(!controller.is_mounted());
        assert_no_registrations(&host);
        assert_eq!(controller.frames_rendered(), 0);
    }

    #[test]
    fn test_double_unmount_is_harmless() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Building);
        let mut controller = mount(&mut host, &mode);
        host.run_for(&mut controller, 0.5, DT);

        controller.unmount(&mut host);
        let first = controller.last_disposal();
        controller.unmount(&mut host);
        assert_eq!(controller.last_disposal(), first);
        assert_no_registrations(&host);
    }

    #[test]
    fn test_disposal_releases_every_resource_once() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);
        host.run_for(&mut controller, 0.2, DT);

        let before = controller.graph().unwrap().resources().stats();
        let nodes = controller.graph().unwrap().node_count();
        controller.unmount(&mut host);

        let report = controller.last_disposal().unwrap();
        assert_eq!(report.geometries, before.live_geometries);
        assert_eq!(report.materials, before.live_materials);
        assert_eq!(report.nodes, nodes - 1);
        assert!(controller.graph().is_none());
    }

    #[test]
    fn test_stale_frame_after_unmount_is_ignored() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);
        let token = host.pending_frames()[0];

        controller.unmount(&mut host);
        assert!(controller.on_frame(&mut host, token, 1.0).is_none());
        assert_no_registrations(&host);
    }

    #[test]
    fn test_unknown_frame_token_is_ignored() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);
        let pending = controller.pending_frame();

        assert!(controller.on_frame(&mut host, FrameToken(u64::MAX), 0.5).is_none());
        assert_eq!(controller.pending_frame(), pending);
        assert_eq!(controller.frames_rendered(), 0);

        controller.unmount(&mut host);
    }

    #[test]
    fn test_events_after_unmount_are_ignored() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);
        controller.unmount(&mut host);

        host.scroll_to(1200.0);
        host.resize(640, 480);
        assert_eq!(host.dispatch(&mut controller), 0);
        assert!(host.pump_frame(&mut controller, DT).is_none());
    }

    #[test]
    fn test_scroll_fraction_stays_in_unit_range() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        for offset in [-300.0, 0.0, 1640.0, 3280.0, 1.0e9, f64::NAN] {
            host.scroll_to(offset);
            host.dispatch(&mut controller);
            let fraction = controller.scroll_fraction().unwrap();
            assert!((0.0..=1.0).contains(&fraction), "offset {offset} gave {fraction}");
        }

        host.set_document_height(500.0);
        host.scroll_to(50.0);
        host.dispatch(&mut controller);
        assert_eq!(controller.scroll_fraction(), Some(0.0));

        controller.unmount(&mut host);
    }

    #[test]
    fn test_workplace_steady_state() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        let reports = host.run_for(&mut controller, 5.0, DT);
        let last = reports.last().unwrap();
        assert_abs_diff_eq!(last.workplace_scale, 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(last.building_scale, 0.0, epsilon = 1e-4);
        assert!(last.workplace_visible);
        assert!(!last.building_visible);

        let graph = controller.graph().unwrap();
        let handles = controller.handles().unwrap();
        assert!(!graph.node(handles.building).unwrap().visible);

        let hidden = subtree(graph, handles.building);
        let drawn = controller.backend().unwrap().last_drawn();
        assert!(!drawn.is_empty());
        assert!(drawn.iter().all(|id| !hidden.contains(id)));

        controller.unmount(&mut host);
    }

    #[test]
    fn test_switch_to_building() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);
        host.pump_frame(&mut controller, DT);

        mode.set(Mode::Building);
        let reports = host.run_for(&mut controller, 5.0, DT);

        let mut previous = 0.0;
        for report in &reports {
            assert!((0.0..=1.0).contains(&report.workplace_scale));
            assert!((0.0..=1.0).contains(&report.building_scale));
            assert!(report.blend >= previous);
            previous = report.blend;
        }

        let last = reports.last().unwrap();
        assert_abs_diff_eq!(last.building_scale, 1.0, epsilon = 1e-4);
        assert!(!last.workplace_visible);
        let handles = controller.handles().unwrap();
        assert!(!controller.graph().unwrap().node(handles.workplace).unwrap().visible);

        // The frame loop picked the change up without re-registering
        assert_eq!(host.listener_count(), 2);
        assert_eq!(host.pending_frame_count(), 1);

        controller.unmount(&mut host);
    }

    #[test]
    fn test_blend_converges_monotonically_between_switches() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        let mut selected = Mode::Workplace;
        for _ in 0..6 {
            selected = selected.toggled();
            mode.set(selected);
            let target = selected.blend_target();

            let start = controller.animation().unwrap().blend;
            let reports = host.run_for(&mut controller, 0.3, DT);
            let mut previous_distance = (target - start).abs();
            for report in &reports {
                assert!((0.0..=1.0).contains(&report.blend));
                let distance = (target - report.blend).abs();
                assert!(distance <= previous_distance, "blend moved away from {target}");
                previous_distance = distance;
            }
        }

        controller.unmount(&mut host);
    }

    #[test]
    fn test_zoom_converges_for_fixed_scroll() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        host.scroll_to_fraction(0.5);
        let reports = host.run_for(&mut controller, 10.0, DT);

        let expected = target_zoom(&ZoomConfig::default(), 0.5);
        assert_abs_diff_eq!(reports.last().unwrap().zoom, expected, epsilon = 1e-3);
        assert_abs_diff_eq!(controller.camera().unwrap().zoom, expected, epsilon = 1e-3);
        assert_abs_diff_eq!(controller.backend().unwrap().last_zoom().unwrap(), expected, epsilon = 1e-3);

        controller.unmount(&mut host);
    }

    #[test]
    fn test_zoom_non_decreasing_while_scrolling_down() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        let mut previous = controller.animation().unwrap().zoom;
        for step in 1..=100 {
            host.scroll_to_fraction(f64::from(step) / 100.0);
            let report: FrameReport = host.pump_frame(&mut controller, DT).unwrap();
            assert!(report.zoom >= previous, "zoom fell from {previous} to {} at step {step}", report.zoom);
            previous = report.zoom;
        }

        controller.unmount(&mut host);
    }

    #[test]
    fn test_idle_spin_at_top_and_stillness_below_fold() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        // The first frame has no delta to integrate
        host.pump_frame(&mut controller, DT);
        let mut previous = controller.animation().unwrap().auto_rotation;
        for _ in 0..30 {
            host.pump_frame(&mut controller, DT);
            let current = controller.animation().unwrap().auto_rotation;
            assert!(current > previous);
            previous = current;
        }

        host.scroll_to_fraction(0.6);
        let reports = host.run_for(&mut controller, 5.0, DT);
        let last = reports.last().unwrap();
        assert!(last.scroll >= 0.3);
        assert_abs_diff_eq!(last.spin_step, 0.0, epsilon = 1e-7);

        controller.unmount(&mut host);
    }

    #[test]
    fn test_resize_updates_camera_and_surface() {
        let mut host = host().with_pixel_ratio(3.0);
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);
        assert_relative_eq!(controller.backend().unwrap().pixel_ratio(), 2.0);

        host.resize(1000, 500);
        host.pump_frame(&mut controller, DT);

        let bounds = controller.camera().unwrap().bounds;
        assert_relative_eq!(bounds.right, 28.0);
        assert_relative_eq!(bounds.top, 14.0);
        assert_eq!(controller.backend().unwrap().size(), (1000, 500));
        assert_eq!(controller.backend().unwrap().buffer_size(), (2000, 1000));

        controller.unmount(&mut host);
    }

    #[test]
    fn test_missing_context_fails_mount_cleanly() {
        let mut host = host();
        host.fail_context_creation("graphics disabled");
        let mode = ModeCell::new(Mode::Workplace);

        let result = SceneController::mount(&mut host, ControllerConfig::default(), mode.reader());
        assert!(matches!(result, Err(LifecycleError::Render(_))));
        assert_no_registrations(&host);
    }

    #[test]
    fn test_invalid_config_fails_mount() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut config = ControllerConfig::default();
        config.zoom.exponent = 2.0;

        let result = SceneController::mount(&mut host, config, mode.reader());
        assert!(matches!(result, Err(LifecycleError::Config(_))));
        assert_eq!(host.contexts_created(), 0);
        assert_no_registrations(&host);
    }

    #[test]
    fn test_non_finite_settings_fail_mount() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Building);
        let config: ControllerConfig = toml::from_str("[pan.building]\nx = 0.0\ny = nan\n").unwrap();
        assert!(config.pan.building.y.is_nan());

        let result = SceneController::mount(&mut host, config, mode.reader());
        assert!(matches!(result, Err(LifecycleError::Config(_))));
        assert_no_registrations(&host);
    }

    #[test]
    fn test_run_for_without_time_step_runs_nothing() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        assert!(host.run_for(&mut controller, 1.0, 0.0).is_empty());
        assert!(host.run_for(&mut controller, 1.0, f64::NAN).is_empty());
        assert_eq!(controller.frames_rendered(), 0);
        assert_eq!(host.time(), 0.0);

        controller.unmount(&mut host);
    }

    #[test]
    fn test_lost_context_stops_the_loop() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);
        host.run_for(&mut controller, 0.1, DT);
        let rendered = controller.frames_rendered();

        controller.backend_mut().unwrap().lose_context();
        assert!(host.pump_frame(&mut controller, DT).is_some());
        assert_eq!(host.pending_frame_count(), 0);
        assert!(host.pump_frame(&mut controller, DT).is_none());
        assert_eq!(controller.frames_rendered(), rendered);

        controller.unmount(&mut host);
        assert_no_registrations(&host);
    }

    #[test]
    fn test_remount_starts_fresh() {
        let mut host = host();
        let mode = ModeCell::new(Mode::Workplace);
        let mut controller = mount(&mut host, &mode);

        assert!(matches!(controller.remount(&mut host), Err(LifecycleError::AlreadyMounted)));

        host.run_for(&mut controller, 2.0, DT);
        assert!(controller.animation().unwrap().auto_rotation > 0.0);
        controller.unmount(&mut host);

        controller.remount(&mut host).unwrap();
        assert_eq!(controller.animation().unwrap().auto_rotation, 0.0);
        assert_eq!(controller.mount_count(), 2);
        assert_eq!(host.contexts_created(), 2);
        assert_eq!(host.listener_count(), 2);
        assert!(!controller.backend().unwrap().is_disposed());

        controller.unmount(&mut host);
        assert_no_registrations(&host);
    }
}
