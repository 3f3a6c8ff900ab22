pub mod controller;
pub mod model;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;
