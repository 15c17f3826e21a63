pub mod student;

pub use student::{CreateStudentRequest, Student, UpdateStudentRequest};
