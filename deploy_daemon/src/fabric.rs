pub mod deployer_fabric;
