//! Text command parsing.
//!
//! Commands are read one per line by the interactive front-end and map
//! onto playlist operations.

use thiserror::Error;


/// Number of entries `upcoming` lists when no count is given.
pub const DEFAULT_UPCOMING: usize = 5;


/// Errors that can occur during command parsing.
#[derive( Debug, Error )]
pub enum CommandError {
    #[error( "Unknown command: {0}" )]
    Unknown( String ),

    #[error( "Invalid argument: {0}" )]
    InvalidArgument( String ),
}


/// Parsed playlist command.
#[derive( Debug, Clone, PartialEq, Eq )]
pub enum Command {
    Current,
    Peek,
    Next,
    List,
    Upcoming { count: usize },
    Help,
    Quit,
}


impl Command {
    /// Parses a command line. A leading `/` is accepted and ignored.
    ///
    /// @param input - The command string to parse
    ///
    /// @returns The parsed command or an error
    pub fn parse( input: &str ) -> Result<Self, CommandError> {
        let input = input.trim();
        let input = input.strip_prefix( '/' ).unwrap_or( input );
        let mut parts = input.splitn( 2, ' ' );
        let cmd = parts.next().unwrap_or( "" ).to_lowercase();
        let args = parts.next().map( |s| s.trim() ).filter( |s| !s.is_empty() );

        match cmd.as_str() {
            "current" | "cur" | "c" => Ok( Command::Current ),
            "peek" | "p" => Ok( Command::Peek ),
            "next" | "n" | "advance" => Ok( Command::Next ),
            "list" | "ls" => Ok( Command::List ),
            "upcoming" | "up" => {
                let count = match args {
                    Some( s ) => s.parse().map_err( |_| {
                        CommandError::InvalidArgument( format!( "Invalid count: '{}'", s ) )
                    })?,
                    None => DEFAULT_UPCOMING,
                };
                Ok( Command::Upcoming { count } )
            }
            "help" | "h" | "?" => Ok( Command::Help ),
            "quit" | "q" | "exit" => Ok( Command::Quit ),

            "" => Err( CommandError::Unknown( "empty command".into() ) ),
            other => Err( CommandError::Unknown( other.to_string() ) ),
        }
    }


    /// Returns a brief description of the command for help text.
    pub fn description( &self ) -> &'static str {
        match self {
            Command::Current => "Show the current item",
            Command::Peek => "Show the item that plays next",
            Command::Next => "Advance to the next item",
            Command::List => "List the active cycle",
            Command::Upcoming { .. } => "List upcoming items",
            Command::Help => "Show help",
            Command::Quit => "Quit",
        }
    }
}


/// Returns help text listing all available commands.
pub fn help_text() -> &'static str {
    r#"Commands:
  current         Show the current item        [c]
  peek            Show the item that plays next [p]
  next            Advance to the next item     [n]
  list            List the active cycle        [ls]
  upcoming [N]    List the next N items        [up]
  help            Show this help               [?]
  quit            Exit rotaplay                [q]"#
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_parse_aliases() {
        assert_eq!( Command::parse( "current" ).unwrap(), Command::Current );
        assert_eq!( Command::parse( "c" ).unwrap(), Command::Current );
        assert_eq!( Command::parse( "peek" ).unwrap(), Command::Peek );
        assert_eq!( Command::parse( "n" ).unwrap(), Command::Next );
        assert_eq!( Command::parse( "advance" ).unwrap(), Command::Next );
        assert_eq!( Command::parse( "ls" ).unwrap(), Command::List );
        assert_eq!( Command::parse( "?" ).unwrap(), Command::Help );
        assert_eq!( Command::parse( "exit" ).unwrap(), Command::Quit );
    }


    #[test]
    fn test_parse_leading_slash_and_case() {
        assert_eq!( Command::parse( "  /NEXT " ).unwrap(), Command::Next );
    }


    #[test]
    fn test_parse_upcoming_with_count() {
        let cmd = Command::parse( "upcoming 12" ).unwrap();
        assert_eq!( cmd, Command::Upcoming { count: 12 } );
    }


    #[test]
    fn test_parse_upcoming_default() {
        let cmd = Command::parse( "up" ).unwrap();
        assert_eq!( cmd, Command::Upcoming { count: DEFAULT_UPCOMING } );
    }


    #[test]
    fn test_parse_upcoming_invalid() {
        let result = Command::parse( "up many" );
        assert!( matches!( result, Err( CommandError::InvalidArgument( _ ) ) ) );
    }


    #[test]
    fn test_parse_unknown() {
        let result = Command::parse( "foobar" );
        assert!( matches!( result, Err( CommandError::Unknown( _ ) ) ) );
    }


    #[test]
    fn test_parse_empty() {
        let result = Command::parse( "   " );
        assert!( matches!( result, Err( CommandError::Unknown( _ ) ) ) );
    }
}
