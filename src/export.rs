use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use glam::Vec3;
use image::{Rgba, RgbaImage};
use mesh_tools::GltfBuilder;
use mesh_tools::Triangle;

use crate::grid::Grid;

/// Largest image edge, in pixels, the PNG writer will allocate
pub const MAX_IMAGE_SIDE: u32 = 16_384;

/// Map a cell value to an 8-bit gray level relative to `[min, max]`
fn gray_level(value: f64, min: f64, max: f64) -> u8 {
    let span = max - min;
    if span <= 0.0 {
        return 0;
    }
    (((value - min) / span) * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Render the grid as an opaque grayscale image
///
/// * `grid` - The grid to render
/// * `min` - Value drawn as black
/// * `max` - Value drawn as white
/// * `pixel_size` - Edge length in pixels of the block drawn for each cell
///
/// Cell `(x, y)` covers the block whose top-left pixel is
/// `(x * pixel_size, y * pixel_size)`. Fails when the image edge would
/// exceed [`MAX_IMAGE_SIDE`].
pub fn grid_to_image(grid: &Grid, min: f64, max: f64, pixel_size: u32) -> Result<RgbaImage> {
    let pixel_size = pixel_size.max(1);
    let side = u32::try_from(grid.size())
        .ok()
        .and_then(|size| size.checked_mul(pixel_size))
        .filter(|&side| side <= MAX_IMAGE_SIDE);
    let Some(side) = side else {
        bail!(
            "a {}x{} grid at {} pixels per cell exceeds the {} pixel image limit",
            grid.size(),
            grid.size(),
            pixel_size,
            MAX_IMAGE_SIDE
        );
    };
    let mut img = RgbaImage::new(side, side);

    for (x, row) in grid.rows().enumerate() {
        for (y, &value) in row.iter().enumerate() {
            let g = gray_level(value, min, max);
            let (px, py) = (x as u32 * pixel_size, y as u32 * pixel_size);
            for dy in 0..pixel_size {
                for dx in 0..pixel_size {
                    img.put_pixel(px + dx, py + dy, Rgba([g, g, g, 255]));
                }
            }
        }
    }

    Ok(img)
}

/// Append `.png` unless the path already ends with it
fn with_png_extension(path: &Path) -> PathBuf {
    let has_png = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false);
    if has_png {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".png");
        PathBuf::from(name)
    }
}

/// Save the grid as a grayscale PNG
///
/// Returns the path actually written, which gains a `.png` extension when
/// the requested one lacks it.
pub fn export_png(grid: &Grid, min: f64, max: f64, pixel_size: u32, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = with_png_extension(path.as_ref());
    let img = grid_to_image(grid, min, max, pixel_size)?;
    img.save(&path)
        .with_context(|| format!("failed to write PNG to {}", path.display()))?;
    Ok(path)
}

/// Export the grid as CSV, one line per row
pub fn export_csv(grid: &Grid, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    // Grid dimensions as a header comment
    writeln!(writer, "# Grid dimensions: {} x {}", grid.size(), grid.size())?;

    for row in grid.rows() {
        let line = row
            .iter()
            .map(|value| format!("{:.6}", value))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;
    Ok(())
}

/// Export the grid as a headerless little-endian `f32` heightmap, row-major
pub fn export_raw(grid: &Grid, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let values: Vec<f32> = grid.as_slice().iter().map(|&v| v as f32).collect();
    let bytes: Vec<u8> = if cfg!(target_endian = "little") {
        bytemuck::cast_slice::<f32, u8>(&values).to_vec()
    } else {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    };
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Exports the grid as a 3D terrain mesh in GLB format
///
/// # Arguments
/// * `grid` - The grid containing height values
/// * `scale_x` - Spacing between rows
/// * `scale_y` - Spacing between columns
/// * `scale_z` - Height multiplier
/// * `output_path` - Path where the GLB file will be saved
///
/// Grids with fewer than 2 cells per side have no triangles and are rejected.
pub fn export_glb(grid: &Grid, scale_x: f32, scale_y: f32, scale_z: f32, output_path: impl AsRef<Path>) -> Result<()> {
    let output_path = output_path.as_ref();
    let size = grid.size();
    if size < 2 {
        bail!("cannot build a mesh from a {}x{} grid", size, size);
    }
    let path_str = output_path
        .to_str()
        .with_context(|| format!("GLB path {} is not valid UTF-8", output_path.display()))?;

    let mut builder = GltfBuilder::new();

    let mut positions = Vec::with_capacity(size * size);
    let mut normals = Vec::with_capacity(size * size);
    let mut texcoords = Vec::with_capacity(size * size);
    let mut indices = Vec::with_capacity((size - 1) * (size - 1) * 2);

    for x in 0..size {
        for y in 0..size {
            let height = grid.get(x, y).unwrap_or(0.0) as f32 * scale_z;

            // Centered around the origin, height on the up axis
            let x_pos = (x as f32 - size as f32 / 2.0) * scale_x;
            let y_pos = (y as f32 - size as f32 / 2.0) * scale_y;
            positions.push(mesh_tools::compat::point3::new(x_pos, height, y_pos));

            let normal = surface_normal(grid, x, y, scale_x, scale_y, scale_z);
            normals.push(mesh_tools::compat::vector3::new(normal.x, normal.y, normal.z));

            texcoords.push(mesh_tools::compat::vector2::new(
                x as f32 / (size as f32 - 1.0),
                y as f32 / (size as f32 - 1.0),
            ));
        }
    }

    // Two triangles per cell
    for x in 0..(size - 1) {
        for y in 0..(size - 1) {
            let top_left = (x * size + y) as u32;
            let top_right = (x * size + y + 1) as u32;
            let bottom_left = ((x + 1) * size + y) as u32;
            let bottom_right = ((x + 1) * size + y + 1) as u32;

            indices.push(Triangle::new(top_left, bottom_left, top_right));
            indices.push(Triangle::new(top_right, bottom_left, bottom_right));
        }
    }

    let mesh_index = builder.create_simple_mesh(
        Some("TerrainMesh".to_string()),
        &positions,
        &indices,
        Some(normals),
        Some(texcoords),
        None,
    );

    let node = builder.add_node(Some("Terrain".to_string()), Some(mesh_index), None, None, None);
    builder.add_scene(Some("Main Scene".to_string()), Some(vec![node]));

    builder
        .export_glb(path_str)
        .with_context(|| format!("failed to write GLB to {}", output_path.display()))?;

    Ok(())
}

/// Surface normal at `(x, y)` from central differences, in mesh space
/// (height on the Y axis); samples outside the grid read as zero height
fn surface_normal(grid: &Grid, x: usize, y: usize, scale_x: f32, scale_y: f32, scale_z: f32) -> Vec3 {
    let height = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 {
            return 0.0;
        }
        grid.get(x as usize, y as usize).map(|v| v as f32 * scale_z).unwrap_or(0.0)
    };

    let (xi, yi) = (x as isize, y as isize);
    let dx = (height(xi + 1, yi) - height(xi - 1, yi)) / (2.0 * scale_x);
    let dy = (height(xi, yi + 1) - height(xi, yi - 1)) / (2.0 * scale_y);

    Vec3::new(-dx, 1.0, -dy).try_normalize().unwrap_or(Vec3::Y)
}
