pub mod backend;
pub mod deploy_configuration;
pub mod deployer;
pub mod deployment_manager;
pub mod identifier_locks;
pub mod sanitize;
