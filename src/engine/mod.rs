pub mod dispatch;
pub mod proof;
pub mod route;
pub mod status;
pub mod verification;
pub mod workboard;

pub use dispatch::{
    BatchDeliveryItem, BatchFailure, BatchPickupItem, BatchReport, DeliveryReceipt,
    DeliveryRequest, DispatchEngine, FailureRequest, PackageDetails, PickupRequest,
};
pub use workboard::{
    AvailabilityQuery, AvailablePackage, AvailablePage, TodaySummary, WorkboardStats,
};
