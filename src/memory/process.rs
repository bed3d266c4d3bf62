//! Process-memory backend built on `ReadProcessMemory` (Windows only)

use crate::core::types::{Address, ModuleInfo};
use crate::memory::backend::MemoryBackend;
use std::mem;
use tracing::debug;
use winapi::shared::minwindef::{DWORD, FALSE, LPVOID};
use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
use winapi::um::memoryapi::ReadProcessMemory;
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Module32FirstW, Module32NextW, Process32FirstW, Process32NextW,
    MODULEENTRY32W, PROCESSENTRY32W, TH32CS_SNAPMODULE, TH32CS_SNAPPROCESS,
};
use winapi::um::winnt::{HANDLE, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ};

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}

/// Memory backend reading a live process via the OS debug facilities
pub struct ProcessBackend {
    handle: Option<HANDLE>,
    pid: u32,
}

// The raw handle is only ever used for reads after attach.
unsafe impl Send for ProcessBackend {}
unsafe impl Sync for ProcessBackend {}

impl ProcessBackend {
    pub fn new() -> Self {
        ProcessBackend {
            handle: None,
            pid: 0,
        }
    }

    /// Resolve a process name (or numeric PID string) to a PID
    fn find_pid(target: &str) -> Option<u32> {
        if let Ok(pid) = target.parse::<u32>() {
            return Some(pid);
        }

        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
            if snapshot == INVALID_HANDLE_VALUE {
                return None;
            }

            let mut entry: PROCESSENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as DWORD;

            let mut found = None;
            if Process32FirstW(snapshot, &mut entry) != FALSE {
                loop {
                    let name = wide_to_string(&entry.szExeFile);
                    if name.eq_ignore_ascii_case(target) {
                        found = Some(entry.th32ProcessID);
                        break;
                    }
                    if Process32NextW(snapshot, &mut entry) == FALSE {
                        break;
                    }
                }
            }

            CloseHandle(snapshot);
            found
        }
    }

    fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            unsafe {
                CloseHandle(handle);
            }
        }
    }
}

impl Default for ProcessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend for ProcessBackend {
    fn attach(&mut self, target: &str) -> bool {
        self.close();

        let Some(pid) = Self::find_pid(target) else {
            return false;
        };

        let handle = unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, FALSE, pid) };
        if handle.is_null() {
            return false;
        }

        debug!(pid, "attached to target process");
        self.handle = Some(handle);
        self.pid = pid;
        true
    }

    fn module_by_name(&self, name: &str) -> Option<ModuleInfo> {
        if self.handle.is_none() {
            return None;
        }

        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPMODULE, self.pid);
            if snapshot == INVALID_HANDLE_VALUE {
                return None;
            }

            let mut entry: MODULEENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<MODULEENTRY32W>() as DWORD;

            let mut found = None;
            if Module32FirstW(snapshot, &mut entry) != FALSE {
                loop {
                    let module_name = wide_to_string(&entry.szModule);
                    if module_name.eq_ignore_ascii_case(name) {
                        found = Some(ModuleInfo::new(
                            module_name,
                            Address::new(entry.modBaseAddr as u64),
                            entry.modBaseSize as usize,
                        ));
                        break;
                    }
                    if Module32NextW(snapshot, &mut entry) == FALSE {
                        break;
                    }
                }
            }

            CloseHandle(snapshot);
            found
        }
    }

    fn read_bytes(&self, address: Address, len: usize) -> Option<Vec<u8>> {
        let handle = self.handle?;
        let mut buffer = vec![0u8; len];
        let mut bytes_read = 0usize;

        let result = unsafe {
            ReadProcessMemory(
                handle,
                address.as_u64() as LPVOID,
                buffer.as_mut_ptr() as LPVOID,
                len,
                &mut bytes_read,
            )
        };

        if result == FALSE || bytes_read != len {
            return None;
        }
        Some(buffer)
    }
}

impl Drop for ProcessBackend {
    fn drop(&mut self) {
        self.close();
    }
}
