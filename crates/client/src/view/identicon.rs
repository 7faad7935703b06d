// Deterministic SVG identicons and the cache that holds them.
//
// A seed hashes to a colour and a left-right mirrored 5x5 grid. The cache
// is append-only: seeds are author addresses salted with the viewer's
// secret, a finite reused set, so it grows with the number of authors
// seen in a session and is dropped with the session.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

const GRID: usize = 5;
const CELL_PX: usize = 2;

#[derive(Debug, Default)]
pub struct IdenticonCache {
    entries: HashMap<String, String>,
}

impl IdenticonCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base64 SVG for `seed`, rendered on first request.
    pub fn get(&mut self, seed: &str) -> &str {
        self.entries.entry(seed.to_string()).or_insert_with(|| STANDARD.encode(render_svg(seed)))
    }

    /// `data:` URI for an `<img src>`.
    pub fn data_uri(&mut self, seed: &str) -> String {
        format!("data:image/svg+xml;base64,{}", self.get(seed))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

pub fn render_svg(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let colour = format!(
        "#{:02x}{:02x}{:02x}",
        digest[0] / 2 + 64,
        digest[1] / 2 + 64,
        digest[2] / 2 + 64
    );
    let size = GRID * CELL_PX;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\">\
         <g style=\"fill:{colour};stroke:{colour};stroke-width:0;\">"
    );

    let half = GRID.div_ceil(2);
    for col in 0..half {
        for row in 0..GRID {
            if digest[3 + col * GRID + row] & 1 == 0 {
                continue;
            }
            for x in [col, GRID - 1 - col] {
                svg.push_str(&format!(
                    "<rect x=\"{}\" y=\"{}\" width=\"{CELL_PX}\" height=\"{CELL_PX}\"/>",
                    x * CELL_PX,
                    row * CELL_PX
                ));
                if x == GRID - 1 - x {
                    break;
                }
            }
        }
    }

    svg.push_str("</g></svg>");
    svg
}
