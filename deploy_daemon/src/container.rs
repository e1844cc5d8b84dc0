pub mod container_backend;
pub mod docker_client;
pub mod engine;
pub mod image_load;
