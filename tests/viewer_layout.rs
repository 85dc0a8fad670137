use pdfdeck::command::DispatchOutcome;
use pdfdeck::config::ViewerConfig;
use pdfdeck::store::{FormattedSelection, PageRect, StoreAction};
use pdfdeck::test_utils::test_helpers::reference_viewer;
use pdfdeck::viewer::{PageLayer, RenderNode, Viewer, ViewerPhase, ViewportContent};

fn ready_viewer() -> Viewer {
    let mut viewer = reference_viewer(&ViewerConfig::default());
    viewer.set_engine_loading(false);
    viewer.set_plugins_ready(true);
    viewer
}

fn child_ids(node: &RenderNode) -> Vec<&str> {
    node.children.iter().map(|c| c.id.as_str()).collect()
}

#[test]
fn loading_phases_gate_the_layout() {
    let mut viewer = reference_viewer(&ViewerConfig::default());
    assert_eq!(viewer.phase(), ViewerPhase::EngineLoading);
    let layout = viewer.layout(&viewer.snapshot());
    assert_eq!(
        layout.viewport,
        ViewportContent::Loading("Initializing PDF engine...")
    );
    assert_eq!(layout.roots().count(), 0);

    viewer.set_engine_loading(false);
    assert_eq!(viewer.phase(), ViewerPhase::PluginsInitializing);
    let layout = viewer.layout(&viewer.snapshot());
    assert_eq!(
        layout.viewport,
        ViewportContent::Loading("Loading PDF document...")
    );
    assert!(layout.find("topHeader").is_some());

    viewer.set_plugins_ready(true);
    assert_eq!(viewer.phase(), ViewerPhase::Ready);
    assert!(matches!(
        viewer.layout(&viewer.snapshot()).viewport,
        ViewportContent::Pages { .. }
    ));
}

#[test]
fn regions_follow_placement_and_scroller_position() {
    let viewer = ready_viewer();
    let layout = viewer.layout(&viewer.snapshot());

    let top: Vec<_> = layout.headers.top.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(top, vec!["topHeader", "toolsHeader"]);
    assert!(layout.panels.left.is_empty());
    assert!(layout.panels.right.is_empty());
    assert_eq!(layout.floating.outside_scroller.len(), 1);
    assert_eq!(layout.floating.outside_scroller[0].id, "pageControlsContainer");
    assert!(layout.command_menu.is_none());
}

#[test]
fn slots_render_in_priority_order_and_skip_dangling_ids() {
    let viewer = ready_viewer();
    let layout = viewer.layout_at(&viewer.snapshot(), 1024);
    let start = layout.find("headerStart").unwrap();

    // viewCtrButton has no component and is skipped.
    assert_eq!(
        child_ids(start),
        vec![
            "menuButton",
            "divider1",
            "sidebarButton",
            "divider1",
            "zoom",
            "divider1",
            "panModeButton",
            "pointerModeButton",
        ]
    );
}

#[test]
fn breakpoints_swap_duplicated_controls() {
    let viewer = ready_viewer();
    let state = viewer.snapshot();

    let narrow = viewer.layout_at(&state, 320);
    let start = narrow.find("headerStart").unwrap();
    assert!(start.find("expandLeftActionsButton").is_some());
    assert!(start.find("zoom").is_none());
    assert!(start.find("zoomButton").is_none());

    let medium = viewer.layout_at(&state, 480);
    let start = medium.find("headerStart").unwrap();
    assert!(start.find("zoomButton").is_some());
    assert!(start.find("zoom").is_none());

    let tools = narrow.find("annotationTools").unwrap();
    assert!(tools.find("annotationToolOverflowButton").is_some());
    assert!(tools.find("freehandButton").is_none());
}

#[test]
fn headers_show_only_their_visible_child() {
    let viewer = ready_viewer();
    let layout = viewer.layout(&viewer.snapshot());
    assert_eq!(
        child_ids(layout.find("toolsHeader").unwrap()),
        vec!["annotationTools"]
    );

    assert_eq!(viewer.execute("shapes"), DispatchOutcome::Dispatched);
    let layout = viewer.layout(&viewer.snapshot());
    assert_eq!(
        child_ids(layout.find("toolsHeader").unwrap()),
        vec!["shapeTools"]
    );

    viewer.execute("view");
    assert!(viewer.layout(&viewer.snapshot()).find("toolsHeader").is_none());
}

#[test]
fn sidebar_opens_the_left_panel_with_context() {
    let viewer = ready_viewer();
    viewer.execute("sidebar");
    let layout = viewer.layout(&viewer.snapshot());

    assert_eq!(layout.panels.left.len(), 1);
    let panel = &layout.panels.left[0];
    assert_eq!(panel.id, "leftPanel");
    assert_eq!(child_ids(panel), vec!["leftPanelMain"]);

    viewer.execute("sidebar");
    assert!(viewer.layout(&viewer.snapshot()).panels.left.is_empty());
}

#[test]
fn header_direction_reaches_descendants() {
    let viewer = ready_viewer();
    let layout = viewer.layout(&viewer.snapshot());
    let button = layout.find("menuButton").unwrap();
    assert_eq!(button.context.str("direction"), Some("horizontal"));
}

#[test]
fn menus_open_the_command_menu_and_actions_close_it() {
    let viewer = ready_viewer();
    assert_eq!(
        viewer.activate("menuCtr", Some("menuButton")),
        DispatchOutcome::Dispatched
    );
    let menu = viewer.layout(&viewer.snapshot()).command_menu.unwrap();
    assert_eq!(menu.props.str("activeCommand"), Some("menuCtr"));

    viewer.activate("menuCtr", Some("menuButton"));
    assert!(viewer.layout(&viewer.snapshot()).command_menu.is_none());

    viewer.activate("menuCtr", None);
    viewer.activate("screenshot", None);
    assert!(!viewer.snapshot().plugins.ui.command_menu().open);
}

#[test]
fn unknown_commands_report_unknown() {
    let viewer = ready_viewer();
    assert_eq!(viewer.execute("noSuchCommand"), DispatchOutcome::Unknown);
    assert_eq!(viewer.activate("noSuchCommand", None), DispatchOutcome::Unknown);
}

#[test]
fn missing_renderers_skip_components() {
    let mut viewer = Viewer::new(&ViewerConfig::default()).unwrap();
    viewer.set_engine_loading(false);
    viewer.set_plugins_ready(true);
    let layout = viewer.layout(&viewer.snapshot());
    assert_eq!(layout.roots().count(), 0);
    assert!(matches!(layout.viewport, ViewportContent::Pages { .. }));
}

#[test]
fn layers_appear_only_when_they_have_content() {
    let viewer = ready_viewer();
    let layers = |viewer: &Viewer| match viewer.layout(&viewer.snapshot()).viewport {
        ViewportContent::Pages { layers, .. } => layers,
        other => panic!("unexpected viewport {other:?}"),
    };
    assert_eq!(layers(&viewer), vec![PageLayer::Render, PageLayer::Tiling]);

    viewer.store().dispatch(StoreAction::SetSelection {
        ranges: vec![FormattedSelection {
            page_index: 0,
            rect: PageRect::new(0.0, 0.0, 50.0, 10.0),
            segment_rects: Vec::new(),
        }],
        text: vec!["word".into()],
    });
    viewer.execute("zoomInArea");
    assert_eq!(
        layers(&viewer),
        vec![
            PageLayer::Render,
            PageLayer::Tiling,
            PageLayer::MarqueeZoom,
            PageLayer::Selection,
        ]
    );
}
