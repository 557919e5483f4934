//! Single-owner playlist task
//!
//! `PlaylistService::spawn` moves a `MediaList` into a tokio task and hands
//! out cloneable handles. Requests are queued on a channel and answered one
//! at a time, so callers never touch the engine directly.

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::{ mpsc, oneshot };

use crate::playlist::MediaList;


/// Queue depth before senders wait.
const REQUEST_BUFFER: usize = 32;


/// Errors returned by a `PlaylistHandle`.
#[derive( Debug, Error )]
pub enum ServiceError {
    #[error( "Playlist service has stopped" )]
    Closed,
}


enum Request {
    Current( oneshot::Sender<PathBuf> ),
    PeekNext( oneshot::Sender<Option<PathBuf>> ),
    Advance( oneshot::Sender<Option<PathBuf>> ),
    All( oneshot::Sender<Vec<PathBuf>> ),
    Upcoming( usize, oneshot::Sender<Vec<PathBuf>> ),
}


/// Owner of a playlist running on its own task.
pub struct PlaylistService {
    list: MediaList,
    requests: mpsc::Receiver<Request>,
}


impl PlaylistService {
    /// Spawns the service on the current tokio runtime.
    ///
    /// The task exits once every handle has been dropped.
    pub fn spawn( list: MediaList ) -> PlaylistHandle {
        let ( tx, rx ) = mpsc::channel( REQUEST_BUFFER );
        let service = Self { list, requests: rx };
        tokio::spawn( service.run() );
        PlaylistHandle { tx }
    }


    async fn run( mut self ) {
        tracing::debug!( "Playlist service started" );
        while let Some( request ) = self.requests.recv().await {
            // A dropped reply receiver only means the caller gave up waiting.
            match request {
                Request::Current( reply ) => {
                    let _ = reply.send( self.list.current() );
                }
                Request::PeekNext( reply ) => {
                    let _ = reply.send( self.list.peek_next() );
                }
                Request::Advance( reply ) => {
                    let _ = reply.send( self.list.advance() );
                }
                Request::All( reply ) => {
                    let _ = reply.send( self.list.all() );
                }
                Request::Upcoming( count, reply ) => {
                    let _ = reply.send( self.list.upcoming( count ) );
                }
            }
        }
        tracing::debug!( "Playlist service stopped" );
    }
}


/// Cloneable client for a running `PlaylistService`.
#[derive( Debug, Clone )]
pub struct PlaylistHandle {
    tx: mpsc::Sender<Request>,
}


impl PlaylistHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce( oneshot::Sender<T> ) -> Request,
    ) -> Result<T, ServiceError> {
        let ( reply, response ) = oneshot::channel();
        self.tx.send( make( reply ) ).await.map_err( |_| ServiceError::Closed )?;
        response.await.map_err( |_| ServiceError::Closed )
    }


    /// Gets the current path.
    pub async fn current( &self ) -> Result<PathBuf, ServiceError> {
        self.request( Request::Current ).await
    }


    /// Gets the path the next `advance` would return.
    pub async fn peek_next( &self ) -> Result<Option<PathBuf>, ServiceError> {
        self.request( Request::PeekNext ).await
    }


    /// Moves to the next path and returns it.
    pub async fn advance( &self ) -> Result<Option<PathBuf>, ServiceError> {
        self.request( Request::Advance ).await
    }


    /// Returns a snapshot of the active cycle.
    pub async fn all( &self ) -> Result<Vec<PathBuf>, ServiceError> {
        self.request( Request::All ).await
    }


    /// Returns up to `count` upcoming paths.
    pub async fn upcoming( &self, count: usize ) -> Result<Vec<PathBuf>, ServiceError> {
        self.request( |reply| Request::Upcoming( count, reply ) ).await
    }


    /// Returns true once the service task has exited.
    pub fn is_closed( &self ) -> bool {
        self.tx.is_closed()
    }
}


impl std::fmt::Debug for Request {
    fn fmt( &self, f: &mut std::fmt::Formatter<'_> ) -> std::fmt::Result {
        let name = match self {
            Request::Current( _ ) => "Current",
            Request::PeekNext( _ ) => "PeekNext",
            Request::Advance( _ ) => "Advance",
            Request::All( _ ) => "All",
            Request::Upcoming( _, _ ) => "Upcoming",
        };
        f.write_str( name )
    }
}


#[cfg( test )]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use crate::order::KeepOrder;


    fn keep( names: &[&str] ) -> MediaList {
        MediaList::new( names.iter().map( PathBuf::from ), Box::new( KeepOrder ) ).unwrap()
    }


    #[tokio::test]
    async fn test_handle_mirrors_engine() {
        let handle = PlaylistService::spawn( keep( &[ "a.mp4", "b.mp4", "c.mp4" ] ) );

        assert_eq!( handle.current().await.unwrap(), PathBuf::from( "a.mp4" ) );
        assert_eq!( handle.peek_next().await.unwrap(), Some( PathBuf::from( "b.mp4" ) ) );
        assert_eq!( handle.advance().await.unwrap(), Some( PathBuf::from( "b.mp4" ) ) );
        assert_eq!( handle.upcoming( 2 ).await.unwrap(), vec![ PathBuf::from( "c.mp4" ), PathBuf::from( "a.mp4" ) ] );
        assert_eq!( handle.advance().await.unwrap(), Some( PathBuf::from( "c.mp4" ) ) );
        assert_eq!( handle.advance().await.unwrap(), Some( PathBuf::from( "a.mp4" ) ) );
        assert_eq!( handle.all().await.unwrap().len(), 3 );
    }


    #[tokio::test( flavor = "multi_thread", worker_threads = 4 )]
    async fn test_concurrent_handles() {
        let handle = PlaylistService::spawn( keep( &[ "a", "b", "c", "d", "e" ] ) );

        let tasks: Vec<_> = ( 0..10 )
            .map( |_| {
                let handle = handle.clone();
                tokio::spawn( async move {
                    let mut seen = Vec::new();
                    for _ in 0..20 {
                        seen.push( handle.advance().await.unwrap().unwrap() );
                    }
                    seen
                })
            })
            .collect();

        let mut counts: HashMap<PathBuf, usize> = HashMap::new();
        for task in tasks {
            for path in task.await.unwrap() {
                *counts.entry( path ).or_default() += 1;
            }
        }

        // 200 advances over a 5 item cycle.
        assert_eq!( counts.len(), 5 );
        assert!( counts.values().all( |&n| n == 40 ) );
        assert_eq!( handle.current().await.unwrap(), PathBuf::from( "a" ) );
    }


    #[tokio::test]
    async fn test_closed_service() {
        let ( tx, rx ) = mpsc::channel( 1 );
        drop( rx );
        let handle = PlaylistHandle { tx };

        assert!( handle.is_closed() );
        assert!( matches!( handle.current().await, Err( ServiceError::Closed ) ) );
        assert!( matches!( handle.advance().await, Err( ServiceError::Closed ) ) );
    }
}
