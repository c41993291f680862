pub mod building;
pub mod footprint;
pub mod geometry;
pub mod parcel;
pub mod policy;
pub mod report;

pub use building::{BuildingDataset, EnrichedBuilding};
pub use footprint::{FootprintDataset, RawFootprint, RawHeight};
pub use geometry::{BoundingBox, Coord, Ring};
pub use parcel::{Parcel, ParcelAttributes, ParcelDataset};
pub use policy::{RepresentativePoint, UnmatchedPolicy};
pub use report::{Fallback, SkipReason, StageReport};
