use rand::RngCore;

// Replays a fixed list of uniform draws, repeating the last one once exhausted.
pub struct FixedRng {
    values: Vec<u64>,
    position: usize,
}

impl FixedRng {
    pub fn constant(uniform: f64) -> Self {
        Self::sequence(&[uniform])
    }

    pub fn sequence(uniforms: &[f64]) -> Self {
        assert!(!uniforms.is_empty(), "at least one draw is required");
        let values = uniforms
            .iter()
            .map(|u| {
                assert!((0.0..1.0).contains(u), "uniform draws must lie in [0, 1)");
                ((u * (1_u64 << 53) as f64) as u64) << 11
            })
            .collect();
        Self {
            values,
            position: 0,
        }
    }

    pub fn draws(&self) -> usize {
        self.position
    }
}

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let idx = self.position.min(self.values.len() - 1);
        self.position += 1;
        self.values[idx]
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
