#![deny(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::complexity)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::perf)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![allow(clippy::many_single_char_names)]
#![doc = include_str!("../../README.md")]

/// Error types for the I/O and reconstruction-diagnostic boundary.
pub mod error;
/// Stores the point cloud, helper functions and the main algorithm.
pub mod grid;
/// Load and Save points and meshes.
pub mod io;
/// Internal structures for Points, Edges and Faces.
pub mod mesh;
#[cfg(test)]
mod test;

use core::cell::RefCell;
use std::rc::Rc;
use std::vec;

use glam::Vec3;
use log::warn;

use grid::Grid;
use grid::SeedResult;
use grid::ball_pivot;
use grid::find_reverse_edge_on_front;
use grid::find_seed_triangle;
use grid::get_active_edge;
use grid::glue;
use grid::join;
use grid::not_used;
use grid::on_front;
use grid::output_triangle;
use mesh::EdgeStatus;
use mesh::MeshEdge;
use mesh::MeshFace;
use mesh::MeshPoint;

// Why  Rc<RefCell<MeshPoint>>?
//
// When looping over neighborhood points the design needs mutable access
// to cell points.
//
// for j in 0..neighborhood.len() {
//     for k in 0..neighborhood.len() {
//      /* Mutable access. */
//     }
// }
//
// dipping in and out of adjacent cells to form "neighborhood", a mutable
// collections points,
type Cell = Vec<Rc<RefCell<MeshPoint>>>;

/// A triangle in 3D space, as three vertex positions drawn verbatim from
/// the input point cloud.
#[derive(Debug, Clone, Copy)]
pub struct Triangle([Vec3; 3]);

impl Triangle {
    fn normal(&self) -> Vec3 {
        let cross = (self.0[0] - self.0[1]).cross(self.0[0] - self.0[2]);
        cross.normalize()
    }

    /// The triangle's three vertex positions, in emission order.
    #[must_use]
    pub const fn vertices(&self) -> &[Vec3; 3] {
        &self.0
    }
}

/// Base primitive for triangles and meshes.
#[derive(Debug, Clone, Copy)]
pub struct Point {
    /// Position of the point
    pub pos: Vec3,
    /// Normal of the point
    pub normal: Vec3,
}

/// Returns a mesh from a point cloud.
///
/// Main entry point for this library. Rolls a ball of the given `radius`
/// over `points` and returns the triangles it traces out, or `None` if no
/// seed triangle could be found (an empty or too-sparse point cloud for
/// the chosen radius).
#[must_use]
pub fn reconstruct(points: &[Point], radius: f32) -> Option<Vec<Triangle>> {
    if points.is_empty() {
        warn!("no seed triangle found: point cloud is empty");
        return None;
    }

    let mut grid = Grid::new(points, radius);

    let SeedResult { f, ball_center } = match find_seed_triangle(&grid, radius) {
        None => {
            warn!("no seed triangle found");
            return None;
        }
        Some(seed) => seed,
    };

    let mut triangles: Vec<Triangle> = Vec::new();
    let mut edges: Vec<Rc<RefCell<MeshEdge>>> = Vec::new();
    output_triangle(&f, &mut triangles);

    let seed = f.0;

    let e0 = Rc::new(RefCell::new(MeshEdge::new(
        &seed[0],
        &seed[1],
        &seed[2].clone(),
        ball_center,
    )));
    edges.push(e0.clone());

    let e1 = Rc::new(RefCell::new(MeshEdge::new(
        &seed[1],
        &seed[2],
        &seed[0].clone(),
        ball_center,
    )));
    edges.push(e1.clone());

    let e2 = Rc::new(RefCell::new(MeshEdge::new(
        &seed[2],
        &seed[0],
        &seed[1].clone(),
        ball_center,
    )));
    edges.push(e2.clone());

    e0.borrow_mut().prev = Some(e2.clone());
    e1.borrow_mut().next = Some(e2.clone());
    e0.borrow_mut().next = Some(e1.clone());
    e2.borrow_mut().prev = Some(e1.clone());
    e1.borrow_mut().prev = Some(e0.clone());
    e2.borrow_mut().next = Some(e0.clone());

    seed[0].borrow_mut().edges = vec![e0.clone(), e2.clone()];
    seed[1].borrow_mut().edges = vec![e0.clone(), e1.clone()];
    seed[2].borrow_mut().edges = vec![e1.clone(), e2.clone()];

    let mut front = vec![e0, e1, e2];

    while let Some(e_ij) = get_active_edge(&mut front) {
        let o_k = ball_pivot(&e_ij, &mut grid, radius);

        let mut boundary_test = false;
        if let Some(o_k) = &o_k {
            let nu = not_used(&o_k.p.borrow());
            let of = on_front(&o_k.p.borrow());
            if nu || of {
                boundary_test = true;

                output_triangle(
                    &MeshFace([
                        e_ij.borrow().a.clone(),
                        o_k.p.clone(),
                        e_ij.borrow().b.clone(),
                    ]),
                    &mut triangles,
                );

                let (e_ik, e_kj) = join(&e_ij, &o_k.p, o_k.center, &mut front, &mut edges);
                if let Some(e_ki) = find_reverse_edge_on_front(&e_ik) {
                    glue(&e_ik, &e_ki);
                }

                if let Some(e_jk) = find_reverse_edge_on_front(&e_kj) {
                    glue(&e_kj, &e_jk);
                }
            }
        }
        if !boundary_test {
            e_ij.borrow_mut().status = EdgeStatus::Boundary;
        }
    }

    Some(triangles)
}
