pub mod memory;
pub mod state;
pub mod store;
pub mod supabase;

pub use memory::InMemoryStore;
pub use state::AppState;
pub use store::{
    AppointmentFilter, AppointmentPatch, AppointmentStore, DirectoryStore, DoctorFilter,
    DoctorPatch, PatientFilter, StoreError, StoreResult,
};
pub use supabase::{SupabaseClient, SupabaseStore};
