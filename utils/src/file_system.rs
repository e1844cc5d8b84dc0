pub mod fs_repository;
