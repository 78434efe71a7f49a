pub mod storage;
pub mod supabase;
