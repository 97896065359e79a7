pub mod auth_service;
pub mod car_service;
pub mod contact_service;
pub mod event_service;
pub mod order_service;
pub mod service_appointment_service;
pub mod test_drive_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use car_service::CarService;
pub use contact_service::ContactService;
pub use event_service::EventService;
pub use order_service::OrderService;
pub use service_appointment_service::ServiceAppointmentService;
pub use test_drive_service::TestDriveService;
pub use user_service::UserService;
