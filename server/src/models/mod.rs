pub mod booking;
pub mod event;
pub mod stats;
pub mod user;

pub use booking::{Booking, BookingStatus, EventSnapshot, PaymentStatus, SeatSync};
pub use event::{Event, EventMetadata, EventStatus};
pub use stats::{BookingAnalytics, EventBookingStats, WaitlistBreakdown};
pub use user::{Identity, Role};
