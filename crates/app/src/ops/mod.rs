pub mod daemon;
pub mod get;
pub mod init;
pub mod login;
pub mod logout;
pub mod ls;
pub mod rm;
pub mod share;
pub mod text;
pub mod upload;
pub mod version;

pub use daemon::Daemon;
pub use get::Get;
pub use init::Init;
pub use login::Login;
pub use logout::Logout;
pub use ls::Ls;
pub use rm::Rm;
pub use share::Share;
pub use text::Text;
pub use upload::Upload;
pub use version::Version;
