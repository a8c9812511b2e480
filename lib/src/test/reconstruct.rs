use glam::Vec3;
use insta::assert_debug_snapshot;

use crate::Point;
use crate::Triangle;
use crate::reconstruct;

fn create_spherical_cloud(slices: i32, stacks: i32) -> Vec<Point> {
    let mut points = vec![Point {
        pos: Vec3::new(0.0, 0.0, -1.0),
        normal: Vec3::new(0.0, 0.0, -1.0),
    }];

    for slice in 0..slices {
        for stack in 1..stacks {
            let yaw = (slice as f64 / slices as f64) * 2.0 * std::f64::consts::PI;
            let z = ((stack as f64 / stacks as f64 - 0.5) * std::f64::consts::PI).sin();
            let r = (1.0 - z * z).sqrt();

            let x = (r * yaw.sin()) as f32;
            let y = (r * yaw.cos()) as f32;

            let v = Vec3::new(x as f32, y as f32, z as f32);
            // This makes no sense, but the original C++ code does this
            // could there be a implicit clone?.
            let normal = v - Vec3::new(0.0, 0.0, 0.0).normalize();
            points.push(Point { pos: v, normal });
        }
    }

    points.push(Point {
        pos: Vec3::new(0.0, 0.0, 1.0),
        normal: Vec3::new(0.0, 0.0, 1.0),
    });

    points
}

fn measure_reconstruct(points: &Vec<Point>, radius: f32) -> Option<Vec<Triangle>> {
    let start = std::time::Instant::now();
    let result = reconstruct(points, radius);
    let end = std::time::Instant::now();
    let seconds = (end - start).as_secs_f64();
    // original C++ code uses std::cerr
    match result {
        Some(ref mesh) => {
            println!(
                "Points: {}, Triangles: {}, T/s: {}",
                points.len(),
                mesh.len(),
                mesh.len() as f64 / seconds
            );
            result
        }
        None => {
            println!("No mesh found");
            None
        }
    }
}

#[test]
fn sphere_36_18() {
    let cloud = create_spherical_cloud(36, 18);
    // if let Err(e) = save_points_and_normals(&PathBuf::from("sphere_36_18_cloud.ply"), &cloud) {
    //     eprintln!("Error saving points: {}", e);
    // }

    match measure_reconstruct(&cloud, 0.3_f32) {
        Some(ref triangles) => {
            assert_debug_snapshot!(triangles);
        }
        None => {
            // Must generate a mesh.
            debug_assert!(false);
        }
    }
}

#[test]
fn sphere_100_50() {
    let cloud = create_spherical_cloud(100, 50);
    // if let Err(e) = save_points_and_normals(&PathBuf::from("sphere_100_50_cloud.ply"), &cloud) {
    //     eprintln!("Error saving points: {}", e);
    // }
    match measure_reconstruct(&cloud, 0.1_f32) {
        Some(ref triangles) => {
            assert_debug_snapshot!(triangles);
        }
        None => {
            // Must generate a mesh.
            debug_assert!(false);
        }
    }
}

#[test]
fn tetrahedron() {
    let cloud = vec![
        Point {
            pos: Vec3::new(0.0, 0.0, 0.0),
            normal: Vec3::new(-1.0, -1.0, -1.0).normalize(),
        },
        Point {
            pos: Vec3::new(0.0, 1.0, 0.0),
            normal: Vec3::new(0.0, 1.0, 0.0).normalize(),
        },
        Point {
            pos: Vec3::new(1.0, 0.0, 0.0),
            normal: Vec3::new(1.0, 0.0, 0.0).normalize(),
        },
        Point {
            pos: Vec3::new(0.0, 0.0, 1.0),
            normal: Vec3::new(0.0, 0.0, 1.0).normalize(),
        },
    ];

    match measure_reconstruct(&cloud, 2f32) {
        Some(ref triangles) => {
            assert_debug_snapshot!(triangles);
        }
        None => {
            // Must generate a mesh.
            debug_assert!(false);
        }
    }
}

#[test]
fn cube() {
    let cloud = vec![
        Point {
            pos: Vec3::new(-1.0, -1.0, -1.0),
            normal: Vec3::new(-1.0, -1.0, -1.0).normalize(),
        },
        Point {
            pos: Vec3::new(-1.0, 1.0, -1.0),
            normal: Vec3::new(-1.0, 1.0, -1.0).normalize(),
        },
        Point {
            pos: Vec3::new(1.0, 1.0, -1.0),
            normal: Vec3::new(1.0, 1.0, -1.0).normalize(),
        },
        Point {
            pos: Vec3::new(1.0, -1.0, -1.0),
            normal: Vec3::new(1.0, -1.0, -1.0).normalize(),
        },
        Point {
            pos: Vec3::new(-1.0, -1.0, 1.0),
            normal: Vec3::new(-1.0, -1.0, 1.0).normalize(),
        },
        Point {
            pos: Vec3::new(-1.0, 1.0, 1.0),
            normal: Vec3::new(-1.0, 1.0, 1.0).normalize(),
        },
        Point {
            pos: Vec3::new(1.0, 1.0, 1.0),
            normal: Vec3::new(1.0, 1.0, 1.0).normalize(),
        },
        Point {
            pos: Vec3::new(1.0, -1.0, 1.0),
            normal: Vec3::new(1.0, -1.0, 1.0).normalize(),
        },
    ];

    match measure_reconstruct(&cloud, 2f32) {
        Some(ref triangles) => {
            assert_debug_snapshot!(triangles);
        }
        None => {
            // Must generate a mesh.
            debug_assert!(false);
        }
    }
}

// A small, non-grid-aligned point cloud standing in for a subsampled scan:
// organic enough that some pivots succeed and some edges terminate at the
// boundary, unlike the axis-aligned fixtures above.
fn create_irregular_patch() -> Vec<Point> {
    let mut points = Vec::new();
    for i in 0..6 {
        for j in 0..6 {
            let x = i as f32 + 0.15 * (j as f32).sin();
            let y = j as f32 + 0.15 * (i as f32).cos();
            let z = 0.1 * ((i + j) as f32).sin();
            let normal = Vec3::new(-0.1 * (i as f32).cos(), -0.1 * (j as f32).sin(), 1.0).normalize();
            points.push(Point {
                pos: Vec3::new(x, y, z),
                normal,
            });
        }
    }
    points
}

fn assert_mesh_is_well_formed(points: &[Point], triangles: &[Triangle], radius: f32) {
    for t in triangles {
        let [v0, v1, v2] = *t.vertices();

        // Vertex provenance: every vertex position appears verbatim in the input.
        for v in [v0, v1, v2] {
            assert!(
                points.iter().any(|p| p.pos == v),
                "triangle vertex {v:?} is not one of the input points"
            );
        }

        // Non-self-triangle: no two vertices coincide.
        assert_ne!(v0, v1);
        assert_ne!(v1, v2);
        assert_ne!(v0, v2);

        // Ball existence on emission: a ball of radius r tangent to all three
        // vertices exists and its interior (up to the emptiness tolerance)
        // contains no input point within 2r of the centroid.
        let centroid = (v0 + v1 + v2) / 3.0;
        let ab = v1 - v0;
        let ac = v2 - v0;
        let ab_cross_ac = ab.cross(ac);
        let to_circumcenter =
            (ab_cross_ac.cross(ab) * ac.dot(ac) + ac.cross(ab_cross_ac) * ab.dot(ab))
                / (2.0 * ab_cross_ac.dot(ab_cross_ac));
        let height_squared = radius.mul_add(radius, -to_circumcenter.dot(to_circumcenter));
        assert!(
            height_squared >= 0.0,
            "no ball of radius {radius} passes through {v0:?} {v1:?} {v2:?}"
        );

        let cell_size = 2.0 * radius;
        for p in points {
            if (p.pos - centroid).length_squared() < cell_size * cell_size {
                // p is near enough to matter; it must not be strictly inside
                // the tangent ball beyond the emptiness tolerance.
                let circumcenter = v0 + to_circumcenter;
                let normal = (v0 - v1).cross(v0 - v2).normalize();
                let center = circumcenter + normal * height_squared.sqrt();
                let dist_sq = (p.pos - center).length_squared();
                assert!(
                    dist_sq >= radius.mul_add(radius, -1e-3),
                    "point {:?} lies inside the ball for triangle {v0:?} {v1:?} {v2:?}",
                    p.pos
                );
            }
        }
    }
}

#[test]
fn irregular_patch_produces_a_well_formed_mesh() {
    let cloud = create_irregular_patch();
    let radius = 1.2_f32;

    match measure_reconstruct(&cloud, radius) {
        Some(triangles) => {
            assert!(!triangles.is_empty());
            assert_mesh_is_well_formed(&cloud, &triangles, radius);
        }
        None => debug_assert!(false, "expected a non-empty mesh"),
    }
}

#[test]
fn degenerate_radius_reports_no_seed() {
    let cloud = vec![
        Point {
            pos: Vec3::new(0.0, 0.0, 0.0),
            normal: Vec3::new(-1.0, -1.0, -1.0).normalize(),
        },
        Point {
            pos: Vec3::new(0.0, 1.0, 0.0),
            normal: Vec3::new(0.0, 1.0, 0.0).normalize(),
        },
        Point {
            pos: Vec3::new(1.0, 0.0, 0.0),
            normal: Vec3::new(1.0, 0.0, 0.0).normalize(),
        },
        Point {
            pos: Vec3::new(0.0, 0.0, 1.0),
            normal: Vec3::new(0.0, 0.0, 1.0).normalize(),
        },
    ];

    assert!(reconstruct(&cloud, 0.1).is_none());
}

fn flat_square_grid() -> Vec<Point> {
    let mut points = Vec::new();
    for x in 0..3 {
        for y in 0..3 {
            points.push(Point {
                pos: Vec3::new(x as f32, y as f32, 0.0),
                normal: Vec3::new(0.0, 0.0, 1.0),
            });
        }
    }
    points
}

#[test]
fn flat_square_grid_triangulates_into_eight_triangles() {
    let cloud = flat_square_grid();

    let triangles = reconstruct(&cloud, 0.8).expect("expected a seed on a coplanar grid");
    assert_eq!(triangles.len(), 8);

    assert_mesh_is_well_formed(&cloud, &triangles, 0.8);
    for t in &triangles {
        assert!(
            t.vertices().iter().all(|v| v.z == 0.0),
            "all vertices are coplanar with z=0"
        );
    }
}

#[test]
fn two_disconnected_patches_do_not_share_edges() {
    let mut cloud = flat_square_grid();
    let offset = Vec3::new(1000.0, 1000.0, 0.0);
    for p in flat_square_grid() {
        cloud.push(Point {
            pos: p.pos + offset,
            normal: p.normal,
        });
    }

    let triangles = reconstruct(&cloud, 0.8).expect("expected seeds on both patches");
    assert_eq!(triangles.len(), 16);

    for t in &triangles {
        let [v0, v1, v2] = *t.vertices();
        let far = [v0, v1, v2].iter().filter(|v| v.x > 500.0).count();
        assert!(
            far == 0 || far == 3,
            "triangle {v0:?} {v1:?} {v2:?} mixes the two patches"
        );
    }
}

#[test]
fn single_point_has_no_seed() {
    let cloud = vec![Point {
        pos: Vec3::new(0.0, 0.0, 0.0),
        normal: Vec3::new(0.0, 0.0, 1.0),
    }];

    assert!(reconstruct(&cloud, 1.0).is_none());
}

#[test]
fn empty_input_has_no_seed() {
    let cloud: Vec<Point> = vec![];
    assert!(reconstruct(&cloud, 1.0).is_none());
}

#[test]
fn reconstruct_is_deterministic() {
    let cloud = create_irregular_patch();

    let first = reconstruct(&cloud, 1.2).expect("expected a mesh");
    let second = reconstruct(&cloud, 1.2).expect("expected a mesh");

    let flatten = |triangles: &[Triangle]| -> Vec<[Vec3; 3]> {
        triangles.iter().map(|t| *t.vertices()).collect()
    };

    assert_eq!(flatten(&first), flatten(&second));
}
