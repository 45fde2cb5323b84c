use std::fs;

use pcbgfx_core::board::{BoardOutline, Model3d, Track, Via};
use pcbgfx_core::geometry::point_in_polygon;
use pcbgfx_core::{Board, BoardLayer, Footprint, IPoint, Mesh, Point};
use pcbgfx_export::{export_vrml_file, ExportSettings, ExportWarning, ModelPaths, VrmlLayer, VrmlScene};

const MM: i32 = 1_000_000;

fn square_board(side: i32) -> Board {
    let mut board = Board::new("square");
    board.outline = Some(BoardOutline {
        outlines: vec![vec![
            IPoint::new(0, 0),
            IPoint::new(side, 0),
            IPoint::new(side, side),
            IPoint::new(0, side),
        ]],
        holes: Vec::new(),
    });
    board
}

fn build_scene(board: &Board) -> VrmlScene {
    let dir = tempfile::tempdir().unwrap();
    let paths = ModelPaths {
        model_root: dir.path().to_path_buf(),
        output_dir: dir.path().to_path_buf(),
    };
    VrmlScene::build(board, &ExportSettings::default(), &paths, "scene.wrl").unwrap()
}

fn covers(mesh: &Mesh, p: Point) -> bool {
    mesh.triangles.iter().any(|t| {
        let tri = t.map(|i| mesh.vertices[i]);
        point_in_polygon(&p, &tri)
    })
}

fn ring_radii(mesh: &Mesh, ring: &[usize]) -> (f64, f64) {
    let radii = ring.iter().map(|&i| mesh.vertices[i].distance_to(&Point::new(0.0, 0.0)));
    radii.fold((f64::MAX, f64::MIN), |(lo, hi), r| (lo.min(r), hi.max(r)))
}

#[test]
fn test_single_track_board() {
    let mut board = square_board(10 * MM);
    board.tracks.push(Track {
        start: IPoint::new(2 * MM, 5 * MM),
        end: IPoint::new(7 * MM, 5 * MM),
        width: MM / 5,
        layer: BoardLayer::FRONT_COPPER,
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("square.wrl");
    let report = export_vrml_file(&board, &ExportSettings::default(), &path, None).unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(report.layer_nodes, 2);
    assert_eq!(report.model_nodes, 0);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("#VRML V2.0 utf8\n"));
    assert_eq!(text.matches("IndexedFaceSet").count(), 2);
    // board body then top copper
    let board_at = text.find("diffuseColor 0.07 0.3 0.12").unwrap();
    let copper_at = text.find("diffuseColor 0.08 0.5 0.1").unwrap();
    assert!(board_at < copper_at);
    assert!(!text.contains("0.749 0.756 0.761"));

    // no temporary files left beside the output
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_through_via_scene() {
    let mut board = square_board(10 * MM);
    board
        .vias
        .push(Via::through(IPoint::new(5 * MM, 5 * MM), 800_000, 400_000));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("via.wrl");
    let report = export_vrml_file(&board, &ExportSettings::default(), &path, None).unwrap();
    // board body, top ring, bottom ring
    assert_eq!(report.layer_nodes, 3);

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("diffuseColor 0.08 0.5 0.1").count(), 2);
}

#[test]
fn test_via_ring_radius_and_centre() {
    let mut board = square_board(10 * MM);
    board
        .vias
        .push(Via::through(IPoint::new(5 * MM, 5 * MM), 800_000, 400_000));
    // the board is centred, so the via lands on the model origin
    let scene = build_scene(&board);
    for layer in [VrmlLayer::TopCopper, VrmlLayer::BottomCopper] {
        let mesh = scene.model.layer(layer).mesh().unwrap();
        assert_eq!(mesh.rings.len(), 2);
        let (lo, hi) = ring_radii(mesh, &mesh.rings[0]);
        assert!(lo > 0.39 && hi < 0.4 + 1e-6, "pad ring radius {}..{}", lo, hi);
        let (lo, hi) = ring_radii(mesh, &mesh.rings[1]);
        assert!(lo > 0.19 && hi < 0.2 + 1e-6, "drill radius {}..{}", lo, hi);
        let area = mesh.area();
        let annulus = std::f64::consts::PI * (0.4 * 0.4 - 0.2 * 0.2);
        assert!((area - annulus).abs() < 0.1 * annulus);
    }
}

#[test]
fn test_drill_cuts_track_ending_on_via() {
    let mut board = square_board(10 * MM);
    board
        .vias
        .push(Via::through(IPoint::new(5 * MM, 5 * MM), 800_000, 400_000));
    board.tracks.push(Track {
        start: IPoint::new(MM, 5 * MM),
        end: IPoint::new(5 * MM, 5 * MM),
        width: 250_000,
        layer: BoardLayer::FRONT_COPPER,
    });
    let scene = build_scene(&board);

    let copper = scene.model.top_copper.mesh().unwrap();
    assert!(!covers(copper, Point::new(0.0, 0.01)));
    assert!(!covers(copper, Point::new(-0.1, 0.01)));
    assert!(covers(copper, Point::new(-2.0, 0.01)));
    assert!(covers(copper, Point::new(0.3, 0.01)));

    let body = scene.model.board.mesh().unwrap();
    assert!(!covers(body, Point::new(0.0, 0.01)));
}

#[test]
fn test_missing_model_is_referenced() {
    let mut board = square_board(20 * MM);
    let mut fp = Footprint::new("U1", IPoint::new(10 * MM, 10 * MM), BoardLayer::FRONT_COPPER);
    fp.orientation = 900.0;
    fp.models.push(Model3d {
        path: "parts\\soic8.wrl".to_string(),
        rotation: [0.0; 3],
        offset: [0.0; 3],
        scale: [1.0; 3],
    });
    board.footprints.push(fp);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models.wrl");
    let report = export_vrml_file(&board, &ExportSettings::default(), &path, Some(dir.path())).unwrap();

    assert_eq!(
        report.warnings,
        vec![ExportWarning::MissingModel {
            path: "parts/soic8.wrl".to_string()
        }]
    );
    assert_eq!(report.model_nodes, 1);
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("url \"parts/soic8.wrl\""));
    assert!(text.contains("rotation 0 0 1 1.570796"));
    assert!(text.contains("translation 0 0 0.8"));
}

#[test]
fn test_board_without_outline_uses_extent() {
    let mut board = Board::new("loose");
    board.tracks.push(Track {
        start: IPoint::new(0, 0),
        end: IPoint::new(5 * MM, 5 * MM),
        width: MM / 4,
        layer: BoardLayer::BACK_COPPER,
    });
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loose.wrl");
    let report = export_vrml_file(&board, &ExportSettings::default(), &path, None).unwrap();
    assert!(report.warnings.contains(&ExportWarning::OutlineFallback));
    assert_eq!(report.layer_nodes, 2);
    assert_eq!(VrmlLayer::BottomCopper.name(), "bot_copper");
}
