pub mod annotations;
pub mod object;
pub mod observer;
pub mod period;
pub mod schedule;
pub mod target;
pub mod time;

pub use annotations::*;
pub use object::*;
pub use observer::*;
pub use period::*;
pub use schedule::*;
pub use target::*;
pub use time::*;
