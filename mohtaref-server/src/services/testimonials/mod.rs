pub mod testimonials_service;

pub use testimonials_service::TestimonialsService;
