pub mod pocketbase;
