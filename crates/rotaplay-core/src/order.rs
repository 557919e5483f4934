//! Cycle ordering strategies
//!
//! A strategy reorders one cycle of paths in place. The playlist engine
//! applies it to a cycle exactly once, when that cycle is staged.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{ Deserialize, Serialize };
use thiserror::Error;


/// Reorders a sequence of paths in place.
///
/// Implementations must accept sequences of any length, including zero.
/// Any `FnMut( &mut [PathBuf] ) + Send` closure is also a strategy.
pub trait SortStrategy: Send {
    fn sort( &mut self, paths: &mut [PathBuf] );
}


impl<F> SortStrategy for F
where
    F: FnMut( &mut [PathBuf] ) + Send,
{
    fn sort( &mut self, paths: &mut [PathBuf] ) {
        self( paths )
    }
}


/// Uniformly random permutation (Fisher-Yates).
pub struct RandomOrder {
    rng: StdRng,
}


impl RandomOrder {
    /// Creates a strategy seeded from system entropy.
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }


    /// Creates a strategy with a fixed seed.
    ///
    /// Successive calls to `sort` still differ from each other, but the
    /// sequence of permutations is reproducible.
    pub fn seeded( seed: u64 ) -> Self {
        Self { rng: StdRng::seed_from_u64( seed ) }
    }
}


impl Default for RandomOrder {
    fn default() -> Self {
        Self::new()
    }
}


impl fmt::Debug for RandomOrder {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        f.write_str( "RandomOrder" )
    }
}


impl SortStrategy for RandomOrder {
    fn sort( &mut self, paths: &mut [PathBuf] ) {
        paths.shuffle( &mut self.rng );
    }
}


/// Lexicographic order by path.
#[derive( Debug, Clone, Copy, Default )]
pub struct Alphabetical;


impl SortStrategy for Alphabetical {
    fn sort( &mut self, paths: &mut [PathBuf] ) {
        paths.sort();
    }
}


/// Leaves the sequence untouched.
#[derive( Debug, Clone, Copy, Default )]
pub struct KeepOrder;


impl SortStrategy for KeepOrder {
    fn sort( &mut self, _paths: &mut [PathBuf] ) {}
}


/// Error returned when parsing an unknown order name.
#[derive( Debug, Error )]
#[error( "Unknown order: '{0}'. Use 'random', 'alphabetical', or 'keep'" )]
pub struct UnknownOrder( pub String );


/// Named selector for the built-in strategies, used by configuration.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize )]
#[serde( rename_all = "lowercase" )]
pub enum OrderKind {
    #[default]
    Random,
    Alphabetical,
    Keep,
}


impl OrderKind {
    /// Builds a fresh strategy instance for this kind.
    pub fn into_strategy( self ) -> Box<dyn SortStrategy> {
        match self {
            OrderKind::Random => Box::new( RandomOrder::new() ),
            OrderKind::Alphabetical => Box::new( Alphabetical ),
            OrderKind::Keep => Box::new( KeepOrder ),
        }
    }
}


impl FromStr for OrderKind {
    type Err = UnknownOrder;


    fn from_str( s: &str ) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" | "shuffle" => Ok( OrderKind::Random ),
            "alphabetical" | "alpha" | "sorted" => Ok( OrderKind::Alphabetical ),
            "keep" | "none" => Ok( OrderKind::Keep ),
            _ => Err( UnknownOrder( s.to_string() ) ),
        }
    }
}


impl fmt::Display for OrderKind {
    fn fmt( &self, f: &mut fmt::Formatter<'_> ) -> fmt::Result {
        f.write_str( match self {
            OrderKind::Random => "random",
            OrderKind::Alphabetical => "alphabetical",
            OrderKind::Keep => "keep",
        })
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    fn paths( names: &[&str] ) -> Vec<PathBuf> {
        names.iter().map( PathBuf::from ).collect()
    }


    #[test]
    fn test_random_is_permutation() {
        let original = paths( &[ "a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4" ] );
        let mut shuffled = original.clone();
        RandomOrder::seeded( 7 ).sort( &mut shuffled );

        let mut sorted = shuffled.clone();
        sorted.sort();
        assert_eq!( sorted, original );
    }


    #[test]
    fn test_random_accepts_empty_and_single() {
        let mut order = RandomOrder::new();
        let mut empty: Vec<PathBuf> = Vec::new();
        order.sort( &mut empty );
        assert!( empty.is_empty() );

        let mut single = paths( &[ "only.mkv" ] );
        order.sort( &mut single );
        assert_eq!( single, paths( &[ "only.mkv" ] ) );
    }


    #[test]
    fn test_random_repeated_calls_vary() {
        let original: Vec<PathBuf> = ( 0..32 ).map( |i| PathBuf::from( format!( "{i}.mp4" ) ) ).collect();
        let mut order = RandomOrder::seeded( 42 );

        let mut first = original.clone();
        order.sort( &mut first );
        let mut second = original.clone();
        order.sort( &mut second );

        assert_ne!( first, second );
    }


    #[test]
    fn test_seeded_is_reproducible() {
        let original = paths( &[ "a", "b", "c", "d", "e", "f", "g", "h" ] );
        let mut left = original.clone();
        let mut right = original.clone();
        RandomOrder::seeded( 3 ).sort( &mut left );
        RandomOrder::seeded( 3 ).sort( &mut right );
        assert_eq!( left, right );
    }


    #[test]
    fn test_random_covers_all_positions() {
        // Every element should be able to land first.
        let original = paths( &[ "a", "b", "c", "d" ] );
        let mut order = RandomOrder::seeded( 11 );
        let mut seen_first = std::collections::HashSet::new();

        for _ in 0..200 {
            let mut cycle = original.clone();
            order.sort( &mut cycle );
            seen_first.insert( cycle[ 0 ].clone() );
        }

        assert_eq!( seen_first.len(), original.len() );
    }


    #[test]
    fn test_alphabetical() {
        let mut cycle = paths( &[ "c.mkv", "a.avi", "b.mp4" ] );
        Alphabetical.sort( &mut cycle );
        assert_eq!( cycle, paths( &[ "a.avi", "b.mp4", "c.mkv" ] ) );
    }


    #[test]
    fn test_keep_order() {
        let mut cycle = paths( &[ "c", "a", "b" ] );
        KeepOrder.sort( &mut cycle );
        assert_eq!( cycle, paths( &[ "c", "a", "b" ] ) );
    }


    #[test]
    fn test_closure_strategy() {
        let mut reverse = |p: &mut [PathBuf]| p.reverse();
        let mut cycle = paths( &[ "a", "b", "c" ] );
        reverse.sort( &mut cycle );
        assert_eq!( cycle, paths( &[ "c", "b", "a" ] ) );
    }


    #[test]
    fn test_order_kind_parse() {
        assert_eq!( "random".parse::<OrderKind>().unwrap(), OrderKind::Random );
        assert_eq!( "Alpha".parse::<OrderKind>().unwrap(), OrderKind::Alphabetical );
        assert_eq!( "keep".parse::<OrderKind>().unwrap(), OrderKind::Keep );
        assert!( "sideways".parse::<OrderKind>().is_err() );
    }


    #[test]
    fn test_order_kind_serde() {
        let kind: OrderKind = serde_json::from_str( "\"alphabetical\"" ).unwrap();
        assert_eq!( kind, OrderKind::Alphabetical );
        assert_eq!( serde_json::to_string( &OrderKind::Keep ).unwrap(), "\"keep\"" );
    }


    #[test]
    fn test_order_kind_into_strategy() {
        let mut strategy = OrderKind::Alphabetical.into_strategy();
        let mut cycle = paths( &[ "b", "a" ] );
        strategy.sort( &mut cycle );
        assert_eq!( cycle, paths( &[ "a", "b" ] ) );
    }
}
