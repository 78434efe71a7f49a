pub mod booking;
pub mod dashboard;
pub mod intake;

pub use booking::BookingService;
pub use dashboard::DashboardService;
pub use intake::IntakeService;
