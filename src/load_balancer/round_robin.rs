//! Round-robin selection.

use crate::load_balancer::endpoint::Endpoint;

/// Round-robin selector.
/// Stores a persistent cursor; every scan step consumes exactly one turn,
/// whether or not the endpoint it lands on is usable.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: u64,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor value (number of turns taken so far).
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Take one turn: return the index under the cursor and advance it.
    pub fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        let index = (self.cursor % len as u64) as usize;
        self.cursor = self.cursor.wrapping_add(1);
        index
    }

    /// Scan at most one full rotation for a healthy endpoint.
    pub fn select<T>(&mut self, endpoints: &[Endpoint<T>]) -> Option<usize> {
        if endpoints.is_empty() {
            return None;
        }

        let len = endpoints.len();
        (0..len)
            .map(|_| self.next_index(len))
            .find(|&index| endpoints[index].is_healthy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn endpoints(healthy: &[bool]) -> Vec<Endpoint<()>> {
        healthy
            .iter()
            .enumerate()
            .map(|(i, &h)| {
                let mut ep = Endpoint::new(format!("127.0.0.1:{}", 8080 + i));
                if h {
                    ep.attach(Arc::new(()));
                }
                ep
            })
            .collect()
    }

    #[test]
    fn test_round_robin() {
        let mut lb = RoundRobin::new();
        let backends = endpoints(&[true, true]);

        assert_eq!(lb.select(&backends), Some(0));
        assert_eq!(lb.select(&backends), Some(1));
        assert_eq!(lb.select(&backends), Some(0));
    }

    #[test]
    fn skips_unhealthy_and_advances_per_step() {
        let mut lb = RoundRobin::new();
        let backends = endpoints(&[true, false, true]);

        assert_eq!(lb.select(&backends), Some(0));
        assert_eq!(lb.cursor(), 1);
        // Lands on 1, skips it, takes 2: two turns consumed.
        assert_eq!(lb.select(&backends), Some(2));
        assert_eq!(lb.cursor(), 3);
        assert_eq!(lb.select(&backends), Some(0));
    }

    #[test]
    fn none_when_all_unhealthy() {
        let mut lb = RoundRobin::new();
        let backends = endpoints(&[false, false, false]);

        assert_eq!(lb.select(&backends), None);
        assert_eq!(lb.cursor(), 3);
        assert_eq!(lb.select::<()>(&[]), None);
    }
}
