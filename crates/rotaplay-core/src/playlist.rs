//! Rotating playlist engine
//!
//! A `MediaList` holds two cycles of the same paths: the active cycle being
//! traversed and a staged cycle that becomes active once the active one runs
//! out. The staged cycle is ordered when it is staged, so rotation is a swap
//! and never waits on a scan or a full re-sort of the cycle about to play.
//!
//! All operations run under one lock and the engine is meant to be shared
//! through an `Arc` between a playback controller, a display, preloaders, etc.

use std::path::{ Path, PathBuf };
use std::sync::{ Mutex, MutexGuard, PoisonError };

use thiserror::Error;

use crate::library::{ MediaCollector, ScanError };
use crate::order::{ RandomOrder, SortStrategy };


/// Errors that can occur when building a playlist.
#[derive( Debug, Error )]
pub enum PlaylistError {
    #[error( "No media to play" )]
    EmptyInput,

    #[error( "Scan failed: {0}" )]
    Scan( #[from] ScanError ),
}


/// Mutable state guarded by the engine lock.
struct Cycles {
    active: Vec<PathBuf>,
    staged: Vec<PathBuf>,
    cursor: usize,
    strategy: Box<dyn SortStrategy>,
}


impl Cycles {
    fn at_end( &self ) -> bool {
        self.cursor + 1 >= self.active.len()
    }


    fn peek_next( &self ) -> Option<PathBuf> {
        if !self.at_end() {
            return Some( self.active[ self.cursor + 1 ].clone() );
        }
        match self.staged.first() {
            Some( path ) => Some( path.clone() ),
            None => {
                tracing::debug!( "peek_next: at end of cycle and staged cycle is empty" );
                None
            }
        }
    }


    fn advance( &mut self ) -> Option<PathBuf> {
        if !self.at_end() {
            self.cursor += 1;
            return Some( self.active[ self.cursor ].clone() );
        }

        if self.staged.is_empty() {
            tracing::debug!( "advance: staged cycle is empty, restarting active cycle" );
            self.cursor = 0;
            return self.active.first().cloned();
        }

        self.rotate();
        Some( self.active[ 0 ].clone() )
    }


    /// Promotes the staged cycle and re-orders the demoted one.
    ///
    /// The newly active cycle keeps the order it was given when it was staged.
    fn rotate( &mut self ) {
        std::mem::swap( &mut self.active, &mut self.staged );
        self.cursor = 0;
        self.strategy.sort( &mut self.staged );
        tracing::debug!( "Rotated to next cycle ({} items)", self.active.len() );
    }


    fn upcoming( &self, count: usize ) -> Vec<PathBuf> {
        let after_cursor = self.active.iter().skip( self.cursor + 1 );
        after_cursor
            .chain( self.staged.iter() )
            .take( count )
            .cloned()
            .collect()
    }
}


/// Thread-safe rotating playlist.
pub struct MediaList {
    inner: Mutex<Cycles>,
}


impl MediaList {
    /// Creates a playlist from an initial set of paths.
    ///
    /// The paths are copied into both the active and the staged cycle and
    /// each copy is ordered independently with `strategy`.
    ///
    /// @param paths - Media paths; must not be empty
    /// @param strategy - Ordering applied to every newly staged cycle
    ///
    /// @returns The playlist, or `PlaylistError::EmptyInput`
    pub fn new(
        paths: impl IntoIterator<Item = PathBuf>,
        mut strategy: Box<dyn SortStrategy>,
    ) -> Result<Self, PlaylistError> {
        let mut active: Vec<PathBuf> = paths.into_iter().collect();
        if active.is_empty() {
            return Err( PlaylistError::EmptyInput );
        }

        let mut staged = active.clone();
        strategy.sort( &mut active );
        strategy.sort( &mut staged );
        tracing::debug!( "Created playlist with {} items per cycle", active.len() );

        Ok( Self {
            inner: Mutex::new( Cycles { active, staged, cursor: 0, strategy } ),
        })
    }


    /// Scans `root` with the default collector and builds a randomly ordered playlist.
    pub fn from_folder( root: &Path ) -> Result<Self, PlaylistError> {
        let paths = MediaCollector::default().collect( root )?;
        Self::new( paths, Box::new( RandomOrder::new() ) )
    }


    fn lock( &self ) -> MutexGuard<'_, Cycles> {
        // Every mutation completes before the strategy runs, so a poisoned
        // lock still guards consistent cycles.
        self.inner.lock().unwrap_or_else( PoisonError::into_inner )
    }


    /// Gets the current path.
    pub fn current( &self ) -> PathBuf {
        let cycles = self.lock();
        cycles.active[ cycles.cursor ].clone()
    }


    /// Gets the path `advance` would return, without moving.
    ///
    /// Returns `None` when the active cycle is finished and nothing is staged.
    pub fn peek_next( &self ) -> Option<PathBuf> {
        self.lock().peek_next()
    }


    /// Moves to the next path and returns it.
    ///
    /// At the end of the active cycle the staged cycle is rotated in. If
    /// nothing is staged the active cycle restarts from its first item.
    pub fn advance( &self ) -> Option<PathBuf> {
        self.lock().advance()
    }


    /// Returns a snapshot of the active cycle.
    pub fn all( &self ) -> Vec<PathBuf> {
        self.lock().active.clone()
    }


    /// Returns up to `count` paths in the order `advance` would yield them,
    /// continuing into the staged cycle.
    pub fn upcoming( &self, count: usize ) -> Vec<PathBuf> {
        self.lock().upcoming( count )
    }


    /// Gets the number of items in the active cycle.
    pub fn len( &self ) -> usize {
        self.lock().active.len()
    }


    /// Returns true if the active cycle is empty.
    pub fn is_empty( &self ) -> bool {
        self.lock().active.is_empty()
    }


    /// Gets the cursor position within the active cycle.
    pub fn position( &self ) -> usize {
        self.lock().cursor
    }


    /// Returns true if the cursor is on the last item, so the next
    /// `advance` rotates.
    pub fn is_exhausted( &self ) -> bool {
        self.lock().at_end()
    }
}


impl std::fmt::Debug for MediaList {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        let cycles = self.lock();
        f.debug_struct( "MediaList" )
            .field( "active", &cycles.active )
            .field( "staged", &cycles.staged )
            .field( "cursor", &cycles.cursor )
            .finish_non_exhaustive()
    }
}


#[cfg( test )]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use crate::order::{ Alphabetical, KeepOrder };


    fn paths( names: &[&str] ) -> Vec<PathBuf> {
        names.iter().map( PathBuf::from ).collect()
    }


    fn keep( names: &[&str] ) -> MediaList {
        MediaList::new( paths( names ), Box::new( KeepOrder ) ).unwrap()
    }


    /// Builds an engine with arbitrary cycles, bypassing construction checks.
    fn raw( active: &[&str], staged: &[&str] ) -> MediaList {
        MediaList {
            inner: Mutex::new( Cycles {
                active: paths( active ),
                staged: paths( staged ),
                cursor: 0,
                strategy: Box::new( KeepOrder ),
            }),
        }
    }


    /// Strategy that reverses and counts how often it ran.
    fn counting_reverse( calls: Arc<Mutex<usize>> ) -> Box<dyn SortStrategy> {
        Box::new( move |p: &mut [PathBuf]| {
            *calls.lock().unwrap() += 1;
            p.reverse();
        })
    }


    #[test]
    fn test_new_current_is_from_input() {
        let input = paths( &[ "a.mp4", "b.mp4", "c.mp4" ] );
        let list = MediaList::new( input.clone(), Box::new( RandomOrder::new() ) ).unwrap();
        assert!( input.contains( &list.current() ) );
        assert_eq!( list.len(), 3 );
        assert_eq!( list.position(), 0 );
    }


    #[test]
    fn test_new_empty_fails() {
        let result = MediaList::new( Vec::new(), Box::new( KeepOrder ) );
        assert!( matches!( result, Err( PlaylistError::EmptyInput ) ) );
    }


    #[test]
    fn test_new_sorts_each_cycle_once() {
        let calls = Arc::new( Mutex::new( 0 ) );
        let list = MediaList::new( paths( &[ "a", "b", "c" ] ), counting_reverse( calls.clone() ) ).unwrap();
        assert_eq!( *calls.lock().unwrap(), 2 );
        assert_eq!( list.all(), paths( &[ "c", "b", "a" ] ) );
    }


    #[test]
    fn test_new_cycles_are_independent() {
        // Seeded so the two copies are known to come out different.
        let input: Vec<PathBuf> = ( 0..20 ).map( |i| PathBuf::from( format!( "{i}.mkv" ) ) ).collect();
        let list = MediaList::new( input, Box::new( RandomOrder::seeded( 5 ) ) ).unwrap();
        let active = list.all();
        let staged = list.lock().staged.clone();
        assert_ne!( active, staged );
    }


    #[test]
    fn test_example_scenario() {
        let list = keep( &[ "a.mp4", "b.mp4", "c.mp4" ] );
        assert_eq!( list.current(), PathBuf::from( "a.mp4" ) );
        assert_eq!( list.advance(), Some( PathBuf::from( "b.mp4" ) ) );
        assert_eq!( list.advance(), Some( PathBuf::from( "c.mp4" ) ) );
        assert!( list.is_exhausted() );
        assert_eq!( list.advance(), Some( PathBuf::from( "a.mp4" ) ) );
        assert_eq!( list.position(), 0 );
        assert!( !list.is_exhausted() );
    }


    #[test]
    fn test_traversal_visits_each_once_in_order() {
        let list = MediaList::new(
            paths( &[ "1", "2", "3", "4", "5", "6" ] ),
            Box::new( RandomOrder::seeded( 9 ) ),
        ).unwrap();

        // Start at the beginning of a fresh cycle.
        let cycle = list.all();
        let mut visited = vec![ list.current() ];
        for _ in 1..cycle.len() {
            visited.push( list.advance().unwrap() );
        }
        assert_eq!( visited, cycle );
        assert_eq!( list.all(), cycle );
    }


    #[test]
    fn test_rotation_promotes_staged() {
        let list = MediaList::new(
            paths( &[ "a", "b", "c", "d", "e" ] ),
            Box::new( RandomOrder::seeded( 21 ) ),
        ).unwrap();

        let staged_before = list.lock().staged.clone();
        for _ in 1..list.len() {
            list.advance();
        }

        assert_eq!( list.advance(), Some( staged_before[ 0 ].clone() ) );
        assert_eq!( list.all(), staged_before );
        assert_eq!( list.position(), 0 );
    }


    #[test]
    fn test_rotation_reorders_only_demoted_cycle() {
        let calls = Arc::new( Mutex::new( 0 ) );
        let list = MediaList::new( paths( &[ "a", "b", "c" ] ), counting_reverse( calls.clone() ) ).unwrap();
        // active = [c, b, a], staged = [c, b, a]

        list.advance();
        list.advance();
        assert_eq!( *calls.lock().unwrap(), 2 );

        list.advance();
        assert_eq!( *calls.lock().unwrap(), 3 );
        // The promoted cycle keeps the order it was staged with.
        assert_eq!( list.all(), paths( &[ "c", "b", "a" ] ) );
        // The demoted cycle was reversed once more.
        assert_eq!( list.lock().staged, paths( &[ "a", "b", "c" ] ) );

        list.advance();
        list.advance();
        assert_eq!( list.advance(), Some( PathBuf::from( "a" ) ) );
        assert_eq!( list.all(), paths( &[ "a", "b", "c" ] ) );
    }


    #[test]
    fn test_peek_matches_advance() {
        let list = MediaList::new(
            paths( &[ "a", "b", "c", "d" ] ),
            Box::new( RandomOrder::seeded( 1 ) ),
        ).unwrap();

        for _ in 0..25 {
            let peeked = list.peek_next();
            assert_eq!( peeked, list.advance() );
        }
    }


    #[test]
    fn test_peek_does_not_mutate() {
        let list = keep( &[ "a", "b" ] );
        list.peek_next();
        list.peek_next();
        assert_eq!( list.current(), PathBuf::from( "a" ) );
        assert_eq!( list.position(), 0 );
    }


    #[test]
    fn test_peek_at_end_returns_staged_head() {
        let list = MediaList::new( paths( &[ "b", "a" ] ), Box::new( Alphabetical ) ).unwrap();
        list.advance();
        assert_eq!( list.peek_next(), Some( PathBuf::from( "a" ) ) );
    }


    #[test]
    fn test_single_item_cycle() {
        let list = keep( &[ "only.avi" ] );
        assert!( list.is_exhausted() );
        for _ in 0..3 {
            assert_eq!( list.peek_next(), Some( PathBuf::from( "only.avi" ) ) );
            assert_eq!( list.advance(), Some( PathBuf::from( "only.avi" ) ) );
        }
    }


    #[test]
    fn test_degenerate_empty_staged() {
        let list = raw( &[ "a", "b" ], &[] );
        assert_eq!( list.advance(), Some( PathBuf::from( "b" ) ) );
        assert_eq!( list.peek_next(), None );
        assert_eq!( list.advance(), Some( PathBuf::from( "a" ) ) );
        assert_eq!( list.position(), 0 );
        assert_eq!( list.advance(), Some( PathBuf::from( "b" ) ) );
    }


    #[test]
    fn test_degenerate_everything_empty() {
        let list = raw( &[], &[] );
        assert_eq!( list.peek_next(), None );
        assert_eq!( list.advance(), None );
        assert_eq!( list.advance(), None );
        assert!( list.all().is_empty() );
        assert!( list.is_empty() );
    }


    #[test]
    fn test_all_is_a_snapshot() {
        let list = keep( &[ "a", "b" ] );
        let mut snapshot = list.all();
        snapshot.clear();
        assert_eq!( list.all(), paths( &[ "a", "b" ] ) );
    }


    #[test]
    fn test_upcoming_crosses_into_staged() {
        let list = MediaList::new( paths( &[ "c", "a", "b" ] ), Box::new( Alphabetical ) ).unwrap();
        list.advance();
        assert_eq!( list.upcoming( 3 ), paths( &[ "c", "a", "b" ] ) );
        assert_eq!( list.upcoming( 10 ).len(), 4 );
        assert!( list.upcoming( 0 ).is_empty() );
    }


    #[test]
    fn test_upcoming_matches_advances() {
        let list = MediaList::new(
            paths( &[ "a", "b", "c", "d", "e" ] ),
            Box::new( RandomOrder::seeded( 33 ) ),
        ).unwrap();
        list.advance();
        list.advance();

        let expected = list.upcoming( 6 );
        let actual: Vec<PathBuf> = ( 0..6 ).filter_map( |_| list.advance() ).collect();
        assert_eq!( actual, expected );
    }


    #[test]
    fn test_concurrent_advances_are_serialized() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let names: Vec<String> = ( 0..100 ).map( |i| format!( "{i:03}.mp4" ) ).collect();
        let list = Arc::new(
            MediaList::new( names.iter().map( PathBuf::from ), Box::new( KeepOrder ) ).unwrap()
        );

        let handles: Vec<_> = ( 0..THREADS )
            .map( |_| {
                let list = Arc::clone( &list );
                thread::spawn( move || {
                    ( 0..PER_THREAD ).map( |_| list.advance().unwrap() ).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut visits: Vec<PathBuf> = handles
            .into_iter()
            .flat_map( |h| h.join().unwrap() )
            .collect();

        // 2000 advances over a 100 item cycle: every item exactly 20 times.
        let total = THREADS * PER_THREAD;
        assert_eq!( visits.len(), total );
        visits.sort();
        for chunk in visits.chunks( total / names.len() ) {
            assert!( chunk.iter().all( |p| *p == chunk[ 0 ] ) );
        }
        let distinct: HashSet<_> = visits.iter().collect();
        assert_eq!( distinct.len(), names.len() );

        // Cursor moved exactly `total` steps from position 0.
        assert_eq!( list.position(), total % names.len() );
    }


    #[test]
    fn test_concurrent_readers_see_consistent_state() {
        let list = Arc::new( MediaList::new(
            paths( &[ "a", "b", "c", "d" ] ),
            Box::new( RandomOrder::seeded( 2 ) ),
        ).unwrap() );
        let members: HashSet<PathBuf> = paths( &[ "a", "b", "c", "d" ] ).into_iter().collect();

        let writer = {
            let list = Arc::clone( &list );
            thread::spawn( move || {
                for _ in 0..1000 {
                    list.advance();
                }
            })
        };

        for _ in 0..1000 {
            assert!( members.contains( &list.current() ) );
            assert!( list.peek_next().is_some() );
            assert_eq!( list.all().len(), 4 );
        }
        writer.join().unwrap();
    }


    #[test]
    fn test_from_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write( dir.path().join( "a.mp4" ), b"" ).unwrap();
        std::fs::write( dir.path().join( "b.txt" ), b"" ).unwrap();

        let list = MediaList::from_folder( dir.path() ).unwrap();
        assert_eq!( list.all(), vec![ dir.path().join( "a.mp4" ) ] );
    }


    #[test]
    fn test_from_folder_without_media() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write( dir.path().join( "b.txt" ), b"" ).unwrap();
        let result = MediaList::from_folder( dir.path() );
        assert!( matches!( result, Err( PlaylistError::EmptyInput ) ) );
    }


    #[test]
    fn test_from_folder_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = MediaList::from_folder( &dir.path().join( "gone" ) );
        assert!( matches!( result, Err( PlaylistError::Scan( ScanError::NotFound { .. } ) ) ) );
    }
}
