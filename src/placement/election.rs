use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A strategy for choosing the primary of a group.
///
/// Implementations receive the members of one group, as node indices, and return the index of
/// the member that should become primary, or `None` if no member is eligible. Every strategy
/// yields the same shape of result (one node per group), so the placement directory does not
/// care which one was used.
pub trait Election {
    /// elect one node out of `members`
    fn elect(&mut self, members: &[usize]) -> Option<usize>;
}

/// Elects a member uniformly at random from a seeded, non-cryptographic PRNG.
///
/// Liveness is not considered: any member can be elected.
#[derive(Debug, Clone)]
pub struct RandomElection {
    rng: SmallRng,
}

impl RandomElection {
    /// creates an election seeded from the operating system's entropy source
    pub fn new() -> Self {
        RandomElection {
            rng: SmallRng::from_entropy(),
        }
    }

    /// creates an election with a fixed seed. Two elections with the same seed elect the same
    /// primaries for the same groups.
    pub fn with_seed(seed: u64) -> Self {
        RandomElection {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomElection {
    fn default() -> Self {
        RandomElection::new()
    }
}

impl Election for RandomElection {
    fn elect(&mut self, members: &[usize]) -> Option<usize> {
        members.choose(&mut self.rng).copied()
    }
}

/// Always elects the member with the lowest node index.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMemberElection;

impl Election for FirstMemberElection {
    fn elect(&mut self, members: &[usize]) -> Option<usize> {
        members.iter().min().copied()
    }
}
