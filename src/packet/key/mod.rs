mod public;
mod secret;

pub use self::public::*;
pub use self::secret::*;
