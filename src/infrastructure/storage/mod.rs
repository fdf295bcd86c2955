mod local_filesystem_store;

pub use local_filesystem_store::LocalFilesystemStore;
