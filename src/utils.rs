use rand::Rng;

// --- Helper Functions ---

/// RGBA bytes to normalized floats for uniform buffers.
pub fn rgba_to_f32(color: [u8; 4]) -> [f32; 4] {
    color.map(|c| c as f32 / 255.0)
}

/// Decodes sRGB-encoded channels to linear light, leaving alpha alone.
/// Needed when the surface format is sRGB and does the encoding itself.
pub fn srgb_to_linear(color: [f32; 4]) -> [f32; 4] {
    let decode = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [decode(color[0]), decode(color[1]), decode(color[2]), color[3]]
}

pub fn to_wgpu_color(color: [f32; 4]) -> wgpu::Color {
    let [r, g, b, a] = color;
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

/// One 0/1 word per cell, each alive with probability `alive_probability`.
pub fn random_cells<R: Rng + ?Sized>(rng: &mut R, count: usize, alive_probability: f64) -> Vec<u32> {
    let p = alive_probability.clamp(0.0, 1.0);
    (0..count).map(|_| rng.gen_bool(p) as u32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_rgba_to_f32_bounds() {
        assert_eq!(rgba_to_f32([0, 255, 0, 255]), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_srgb_to_linear_endpoints() {
        let ends = srgb_to_linear([0.0, 1.0, 0.0, 0.5]);
        assert_eq!(ends[0], 0.0);
        assert!((ends[1] - 1.0).abs() < 1e-5);
        assert_eq!(ends[3], 0.5);
        let mid = srgb_to_linear([0.5, 0.5, 0.5, 1.0]);
        assert!((mid[0] - 0.214).abs() < 0.001);
    }

    #[test]
    fn test_random_cells_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(random_cells(&mut rng, 64, 0.0).iter().all(|&c| c == 0));
        assert!(random_cells(&mut rng, 64, 1.0).iter().all(|&c| c == 1));
    }

    #[test]
    fn test_random_cells_is_binary() {
        let mut rng = StdRng::seed_from_u64(99);
        let cells = random_cells(&mut rng, 1000, 0.5);
        assert_eq!(cells.len(), 1000);
        assert!(cells.iter().all(|&c| c <= 1));
        let alive = cells.iter().filter(|&&c| c == 1).count();
        assert!(alive > 300 && alive < 700);
    }
}
