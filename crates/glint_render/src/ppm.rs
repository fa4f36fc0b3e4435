//! PPM (P3) image output.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::renderer::ImageBuffer;

/// Maximum color component value written to the header.
const MAX_COLOR_COMPONENT: u32 = 255;

/// Serialize the image as a text PPM file.
///
/// Header `P3\n<W> <H>\n255\n`, then one image row per line with pixels
/// separated by tabs and components by spaces.
pub fn write_ppm<P: AsRef<Path>>(image: &ImageBuffer, path: P) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "{}", MAX_COLOR_COMPONENT)?;

    for row in 0..image.height {
        for col in 0..image.width {
            let [r, g, b] = image.get(col, row);
            write!(writer, "{} {} {}\t", r, g, b)?;
        }
        writeln!(writer)?;
    }

    writer.flush()
}
