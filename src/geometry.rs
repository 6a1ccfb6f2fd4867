use glam::Vec3;

use crate::model::{Model, ModelPrimitive, Vertex};

const OCTAHEDRON_VERTICES: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

const OCTAHEDRON_FACES: [[usize; 3]; 8] = [
    [0, 2, 4],
    [0, 4, 3],
    [0, 3, 5],
    [0, 5, 2],
    [1, 2, 5],
    [1, 5, 3],
    [1, 3, 4],
    [1, 4, 2],
];

/// Flat-shaded octahedron projected onto a sphere. Each face is split into
/// `(detail + 1)^2` triangles before projection.
pub fn octahedron(name: impl Into<String>, radius: f32, detail: u32, color: Vec3) -> Model {
    let mut vertices = Vec::new();

    for [a, b, c] in OCTAHEDRON_FACES {
        subdivide_face(
            OCTAHEDRON_VERTICES[a],
            OCTAHEDRON_VERTICES[b],
            OCTAHEDRON_VERTICES[c],
            detail,
            |triangle| {
                let triangle = triangle.map(|v| v.normalize() * radius);
                push_flat_triangle(&mut vertices, triangle, color)
            },
        );
    }

    let indices = (0..vertices.len() as u32).collect();

    Model {
        name: name.into(),
        primitives: vec![ModelPrimitive {
            index: 0,
            vertices,
            indices,
            skin_weights: None,
        }],
    }
}

fn subdivide_face(a: Vec3, b: Vec3, c: Vec3, detail: u32, mut emit: impl FnMut([Vec3; 3])) {
    let cols = detail as usize + 1;
    let mut grid: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);

    for i in 0..=cols {
        let t = i as f32 / cols as f32;
        let aj = a.lerp(c, t);
        let bj = b.lerp(c, t);
        let rows = cols - i;

        let row = (0..=rows)
            .map(|j| {
                if rows == 0 {
                    aj
                } else {
                    aj.lerp(bj, j as f32 / rows as f32)
                }
            })
            .collect();
        grid.push(row);
    }

    for i in 0..cols {
        for j in 0..2 * (cols - i) - 1 {
            let k = j / 2;
            if j % 2 == 0 {
                emit([grid[i][k + 1], grid[i + 1][k], grid[i][k]]);
            } else {
                emit([grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]);
            }
        }
    }
}

fn push_flat_triangle(vertices: &mut Vec<Vertex>, [a, b, c]: [Vec3; 3], color: Vec3) {
    let normal = (b - a).cross(c - a).try_normalize().unwrap_or(Vec3::Y);

    for position in [a, b, c] {
        vertices.push(Vertex {
            position,
            normal,
            color,
        });
    }
}
