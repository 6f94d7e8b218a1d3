//! Loop paths for the configured triangle

use triarb_core::{Path, Triangle};

/// Both directions of the 3-cycle, always `[base, first, second, base]`
/// followed by `[base, second, first, base]`. Order is significant: ties in
/// the decision step go to the first path.
pub fn generate_paths(triangle: &Triangle) -> [Path; 2] {
    let base = triangle.base();
    let [first, second] = triangle.legs();
    [
        Path::cycle(base, first, second),
        Path::cycle(base, second, first),
    ]
}
