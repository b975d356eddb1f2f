pub mod balance;
pub mod employee;
pub mod event;
pub mod leave_type;
pub mod request;

pub use balance::{BalanceKey, LeaveBalance};
pub use employee::Employee;
pub use event::LeaveApprovalEvent;
pub use leave_type::LeaveType;
pub use request::{LeaveAction, LeaveRequest, LeaveStatus, LeaveUnit};
