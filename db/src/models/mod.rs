pub mod assignment;
pub mod student;
pub mod student_assignment;

pub use assignment::Entity as Assignment;
pub use student::Entity as Student;
pub use student_assignment::Entity as StudentAssignment;
