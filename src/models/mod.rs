pub mod car;
pub mod contact;
pub mod enums;
pub mod event;
pub mod order;
pub mod service_appointment;
pub mod test_drive;
pub mod user;

pub use car::*;
pub use contact::*;
pub use enums::*;
pub use event::*;
pub use order::*;
pub use service_appointment::*;
pub use test_drive::*;
pub use user::*;
